use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use super::event::{event_questions, question_counts};
use crate::entity::user::Role;
use crate::entity::{answer, event, event_submission, question, teacher_school, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::answer::*;
use crate::state::AppState;
use crate::utils::participation::{AnswerRow, group_by_event, group_by_user};
use crate::utils::school::{find_event, find_teacher_in_school, require_director_school};

/// Load answers matching `condition`, each joined with its question.
async fn answer_rows<C: ConnectionTrait>(
    db: &C,
    condition: Condition,
) -> Result<Vec<AnswerRow>, DbErr> {
    let rows = answer::Entity::find()
        .filter(condition)
        .order_by_desc(answer::Column::CreatedAt)
        .find_also_related(question::Entity)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(a, q)| q.map(|q| AnswerRow::new(a, q)))
        .collect())
}

async fn events_by_id<C: ConnectionTrait>(
    db: &C,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, event::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(event::Entity::find()
        .filter(event::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|e| (e.id, e))
        .collect())
}

#[utoipa::path(
    post,
    path = "/submit",
    tag = "Answers",
    operation_id = "submitAnswers",
    summary = "Submit answers for an event",
    description = "Records one answer per question of the event. Each teacher submits once per event. The whole submission is rejected unless every question of the event is answered exactly once. Requires the TEACHER role.",
    request_body = SubmitAnswersRequest,
    responses(
        (status = 201, description = "Answers recorded", body = SubmitAnswersResponse),
        (status = 400, description = "Missing, unknown or duplicate question IDs (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already submitted for this event (ALREADY_SUBMITTED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, event_id = %payload.event_id))]
pub async fn submit_answers(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Teacher)?;
    validate_submit_request(&payload)?;

    let user_id = auth_user.user_id;
    let event_id = payload.event_id;

    let txn = state.db.begin().await?;
    find_event(&txn, event_id).await?;

    let submitted = event_submission::Entity::find_by_id((event_id, user_id))
        .one(&txn)
        .await?
        .is_some();
    let answered = answer::Entity::find()
        .filter(answer::Column::EventId.eq(event_id))
        .filter(answer::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .is_some();
    if submitted || answered {
        return Err(AppError::AlreadySubmitted);
    }

    let question_ids: Vec<Uuid> = event_questions(&txn, event_id)
        .await?
        .into_iter()
        .map(|q| q.id)
        .collect();
    validate_submission(&payload.answers, &question_ids)?;

    let now = chrono::Utc::now();
    event_submission::ActiveModel {
        event_id: Set(event_id),
        user_id: Set(user_id),
        submitted_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Submission race condition: unique constraint caught on insert");
            AppError::AlreadySubmitted
        }
        _ => AppError::from(e),
    })?;

    let mut rows = Vec::with_capacity(payload.answers.len());
    let mut created = Vec::with_capacity(payload.answers.len());
    for item in payload.answers {
        let id = Uuid::now_v7();
        let answer_text = item
            .answer_text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        rows.push(answer::ActiveModel {
            id: Set(id),
            answer_text: Set(answer_text.clone()),
            selected_option: Set(item.selected_option),
            user_id: Set(user_id),
            question_id: Set(item.question_id),
            event_id: Set(event_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        });
        created.push(AnswerResponse {
            id,
            user_id,
            question_id: item.question_id,
            event_id,
            answer_text,
            selected_option: item.selected_option,
            created_at: now,
            updated_at: now,
        });
    }
    answer::Entity::insert_many(rows).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(answers = created.len(), "Answers submitted");
    Ok((
        StatusCode::CREATED,
        Json(SubmitAnswersResponse {
            message: "Answers submitted successfully".into(),
            answers: created,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/my-history",
    tag = "Answers",
    operation_id = "myHistory",
    summary = "List the caller's answers",
    description = "Returns every answer the calling teacher submitted with its event and question, newest first. Requires the TEACHER role.",
    responses(
        (status = 200, description = "Answer history", body = Vec<HistoryEntry>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn my_history(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    auth_user.require_role(Role::Teacher)?;

    let rows = answer_rows(
        &state.db,
        Condition::all().add(answer::Column::UserId.eq(auth_user.user_id)),
    )
    .await?;

    let mut event_ids: Vec<Uuid> = rows.iter().map(|r| r.event_id).collect();
    event_ids.sort_unstable();
    event_ids.dedup();
    let events = events_by_id(&state.db, event_ids).await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| {
                let name = events
                    .get(&row.event_id)
                    .map(|e| e.name.clone())
                    .unwrap_or_default();
                HistoryEntry::new(row, name)
            })
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/my-participated-events",
    tag = "Answers",
    operation_id = "myParticipatedEvents",
    summary = "List events the caller answered",
    description = "Returns one entry per event the calling teacher answered, with answered and total question counts, newest participation first. Requires the TEACHER role.",
    responses(
        (status = 200, description = "Participated events", body = Vec<ParticipatedEventResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn my_participated_events(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ParticipatedEventResponse>>, AppError> {
    auth_user.require_role(Role::Teacher)?;

    let rows = answer_rows(
        &state.db,
        Condition::all().add(answer::Column::UserId.eq(auth_user.user_id)),
    )
    .await?;
    let groups = group_by_event(rows);

    let event_ids: Vec<Uuid> = groups.iter().map(|g| g.event_id).collect();
    let events = events_by_id(&state.db, event_ids.clone()).await?;
    let totals = question_counts(&state.db, event_ids).await?;

    Ok(Json(
        groups
            .into_iter()
            .filter_map(|g| {
                let event = events.get(&g.event_id)?;
                Some(ParticipatedEventResponse {
                    event_id: g.event_id,
                    event_name: event.name.clone(),
                    event_description: event.description.clone(),
                    is_active: event.is_active,
                    answered_questions_count: g.answered_questions,
                    total_questions_count: totals.get(&g.event_id).copied().unwrap_or(0),
                    participated_at: g.participated_at,
                })
            })
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/my-answers/{eventId}",
    tag = "Answers",
    operation_id = "myAnswers",
    summary = "The caller's answers for one event",
    description = "Returns the calling teacher's answers for an event ordered by question order. Empty if they have not answered it. Requires the TEACHER role.",
    params(("eventId" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Answers for the event", body = MyAnswersResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, event_id = %event_id))]
pub async fn my_answers(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<MyAnswersResponse>, AppError> {
    auth_user.require_role(Role::Teacher)?;
    let event = find_event(&state.db, event_id).await?;

    let mut rows = answer_rows(
        &state.db,
        Condition::all()
            .add(answer::Column::UserId.eq(auth_user.user_id))
            .add(answer::Column::EventId.eq(event_id)),
    )
    .await?;
    rows.sort_by_key(|r| r.question_order);

    Ok(Json(MyAnswersResponse {
        event_id,
        event_name: event.name,
        answers: rows.into_iter().map(AnswerDetail::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/school-results/{eventId}",
    tag = "Answers",
    operation_id = "schoolResults",
    summary = "Answers of the director's school for one event",
    description = "Returns the answers of every teacher of the calling director's school who answered the event, grouped per teacher and ordered by teacher name. Requires the DIRECTOR role.",
    params(("eventId" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "School results", body = SchoolResultsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED, FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(director_id = %auth_user.user_id, event_id = %event_id))]
pub async fn school_results(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<SchoolResultsResponse>, AppError> {
    auth_user.require_role(Role::Director)?;
    let school_id = require_director_school(&state.db, &auth_user).await?;
    let event = find_event(&state.db, event_id).await?;

    let teacher_ids: Vec<Uuid> = teacher_school::Entity::find()
        .filter(teacher_school::Column::SchoolId.eq(school_id))
        .select_only()
        .column(teacher_school::Column::UserId)
        .into_tuple()
        .all(&state.db)
        .await?;

    let total = question_counts(&state.db, vec![event_id])
        .await?
        .get(&event_id)
        .copied()
        .unwrap_or(0);

    let mut teachers = Vec::new();
    if !teacher_ids.is_empty() {
        let rows = answer_rows(
            &state.db,
            Condition::all()
                .add(answer::Column::EventId.eq(event_id))
                .add(answer::Column::UserId.is_in(teacher_ids)),
        )
        .await?;
        let groups = group_by_user(rows);

        let users: HashMap<Uuid, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(groups.iter().map(|g| g.user_id).collect::<Vec<_>>()))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        teachers = groups
            .into_iter()
            .filter_map(|g| {
                let teacher = users.get(&g.user_id)?;
                Some(TeacherResult {
                    teacher_id: g.user_id,
                    teacher_name: teacher.name.clone(),
                    teacher_email: teacher.email.clone(),
                    answered_questions_count: g.answered_questions,
                    total_questions_count: total,
                    answers: g.answers.into_iter().map(AnswerDetail::from).collect(),
                })
            })
            .collect();
        teachers.sort_by(|a, b| {
            a.teacher_name
                .cmp(&b.teacher_name)
                .then_with(|| a.teacher_id.cmp(&b.teacher_id))
        });
    }

    Ok(Json(SchoolResultsResponse {
        event_id,
        event_name: event.name,
        school_id,
        total_questions_count: total,
        teachers,
    }))
}

#[utoipa::path(
    get,
    path = "/teacher-history/{teacherId}",
    tag = "Answers",
    operation_id = "teacherHistory",
    summary = "Complete answer history of one teacher",
    description = "Returns every event a teacher of the calling director's school answered, with the answers, newest first. Requires the DIRECTOR role.",
    params(("teacherId" = Uuid, Path, description = "Teacher user ID")),
    responses(
        (status = 200, description = "Teacher history", body = TeacherHistoryResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Teacher belongs to another school (PERMISSION_DENIED, FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Teacher not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(director_id = %auth_user.user_id, teacher_id = %teacher_id))]
pub async fn teacher_history(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(teacher_id): Path<Uuid>,
) -> Result<Json<TeacherHistoryResponse>, AppError> {
    auth_user.require_role(Role::Director)?;
    let school_id = require_director_school(&state.db, &auth_user).await?;
    let teacher = find_teacher_in_school(&state.db, teacher_id, school_id).await?;

    let rows = answer_rows(
        &state.db,
        Condition::all().add(answer::Column::UserId.eq(teacher_id)),
    )
    .await?;
    let groups = group_by_event(rows);

    let event_ids: Vec<Uuid> = groups.iter().map(|g| g.event_id).collect();
    let events = events_by_id(&state.db, event_ids.clone()).await?;
    let totals = question_counts(&state.db, event_ids).await?;

    let history = groups
        .into_iter()
        .filter_map(|g| {
            let event = events.get(&g.event_id)?;
            Some(TeacherEventHistory {
                event_id: g.event_id,
                event_name: event.name.clone(),
                event_description: event.description.clone(),
                is_active: event.is_active,
                answered_questions_count: g.answered_questions,
                total_questions_count: totals.get(&g.event_id).copied().unwrap_or(0),
                participated_at: g.participated_at,
                answers: g.answers.into_iter().map(AnswerDetail::from).collect(),
            })
        })
        .collect();

    Ok(Json(TeacherHistoryResponse {
        teacher_id,
        teacher_name: teacher.name,
        teacher_email: teacher.email,
        events: history,
    }))
}
