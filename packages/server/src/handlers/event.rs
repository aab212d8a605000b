use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::user::Role;
use crate::entity::{answer, event, event_submission, question};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::event::*;
use crate::models::shared::trim_optional;
use crate::state::AppState;
use crate::utils::school::find_event;

/// Number of questions per event, for the given events.
pub async fn question_counts<C: ConnectionTrait>(
    db: &C,
    event_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, u64>, DbErr> {
    if event_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let counts = question::Entity::find()
        .filter(question::Column::EventId.is_in(event_ids))
        .select_only()
        .column(question::Column::EventId)
        .column_as(question::Column::Id.count(), "count")
        .group_by(question::Column::EventId)
        .into_tuple::<(Uuid, i64)>()
        .all(db)
        .await?;
    Ok(counts
        .into_iter()
        .map(|(event_id, count)| (event_id, count as u64))
        .collect())
}

/// Questions of an event ordered by display position.
pub async fn event_questions<C: ConnectionTrait>(
    db: &C,
    event_id: Uuid,
) -> Result<Vec<question::Model>, DbErr> {
    question::Entity::find()
        .filter(question::Column::EventId.eq(event_id))
        .order_by_asc(question::Column::Position)
        .order_by_asc(question::Column::Id)
        .all(db)
        .await
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create an event with its questions",
    description = "Creates an event and its 1-50 questions in one transaction. `isActive` defaults to true. Requires the ADMIN role.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name, questions = payload.questions.len()))]
pub async fn create_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Admin)?;
    validate_create_event(&payload)?;

    let now = chrono::Utc::now();
    let txn = state.db.begin().await?;

    let model = event::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(payload.name.trim().to_string()),
        description: Set(trim_optional(payload.description)),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let new_questions = payload.questions.iter().map(|q| question::ActiveModel {
        id: Set(Uuid::now_v7()),
        text: Set(q.text.trim().to_string()),
        question_type: Set(q.question_type),
        position: Set(q.order),
        event_id: Set(model.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    });
    question::Entity::insert_many(new_questions).exec(&txn).await?;

    let questions = event_questions(&txn, model.id).await?;
    txn.commit().await?;

    tracing::info!(event_id = %model.id, "Event created");
    Ok((StatusCode::CREATED, Json(EventResponse::new(model, questions))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Events",
    operation_id = "listEvents",
    summary = "List events",
    description = "Returns every event with its question count, newest first. Open to any authenticated user.",
    responses(
        (status = 200, description = "List of events", body = Vec<EventListItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_events(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<EventListItem>>, AppError> {
    let events = event::Entity::find()
        .order_by_desc(event::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let counts = question_counts(&state.db, events.iter().map(|e| e.id).collect()).await?;

    Ok(Json(
        events
            .into_iter()
            .map(|e| {
                let count = counts.get(&e.id).copied().unwrap_or(0);
                EventListItem::new(e, count)
            })
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Events",
    operation_id = "getEvent",
    summary = "Get an event with its questions",
    description = "Returns the event and its questions ordered by `order`. Open to any authenticated user.",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id = %id))]
pub async fn get_event(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventResponse>, AppError> {
    let model = find_event(&state.db, id).await?;
    let questions = event_questions(&state.db, id).await?;
    Ok(Json(EventResponse::new(model, questions)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Events",
    operation_id = "updateEvent",
    summary = "Update an event",
    description = "Partially updates an event's name, description or active flag. Questions are not editable. An empty payload returns the current resource unchanged. Requires the ADMIN role.",
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id = %id))]
pub async fn update_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    auth_user.require_role(Role::Admin)?;
    validate_update_event(&payload)?;

    if payload == UpdateEventRequest::default() {
        let existing = find_event(&state.db, id).await?;
        let questions = event_questions(&state.db, id).await?;
        return Ok(Json(EventResponse::new(existing, questions)));
    }

    let txn = state.db.begin().await?;
    let existing = find_event(&txn, id).await?;
    let mut active: event::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(trim_optional(description));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    let questions = event_questions(&txn, id).await?;
    txn.commit().await?;

    Ok(Json(EventResponse::new(model, questions)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Events",
    operation_id = "deleteEvent",
    summary = "Delete an event",
    description = "Permanently deletes an event with its questions, answers and submissions. Requires the ADMIN role.",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id = %id))]
pub async fn delete_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Admin)?;

    let txn = state.db.begin().await?;
    find_event(&txn, id).await?;

    answer::Entity::delete_many()
        .filter(answer::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    event_submission::Entity::delete_many()
        .filter(event_submission::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    question::Entity::delete_many()
        .filter(question::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    event::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
