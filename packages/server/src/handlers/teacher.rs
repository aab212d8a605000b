use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use sea_orm::sea_query::Query as SeaQuery;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::user::Role;
use crate::entity::{answer, event_submission, teacher_school, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::normalize_email;
use crate::models::teacher::*;
use crate::state::AppState;
use crate::utils::hash;
use crate::utils::school::{
    email_conflict, ensure_email_available, find_teacher_in_school, require_director_school,
};

#[utoipa::path(
    post,
    path = "/",
    tag = "Teachers",
    operation_id = "createTeacher",
    summary = "Create a teacher",
    description = "Creates a teacher account linked to the calling director's school. Requires the DIRECTOR role.",
    request_body = CreateTeacherRequest,
    responses(
        (status = 201, description = "Teacher created", body = TeacherResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED, FORBIDDEN)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(email = %payload.email, director_id = %auth_user.user_id))]
pub async fn create_teacher(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTeacherRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Director)?;
    validate_create_teacher(&payload)?;

    let school_id = require_director_school(&state.db, &auth_user).await?;
    let email = normalize_email(&payload.email);
    let password = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let txn = state.db.begin().await?;
    ensure_email_available(&txn, &email, None).await?;

    let now = chrono::Utc::now();
    let teacher = user::ActiveModel {
        id: Set(Uuid::now_v7()),
        email: Set(email),
        password: Set(password),
        name: Set(payload.name.trim().to_string()),
        role: Set(Role::Teacher),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(email_conflict)?;

    teacher_school::ActiveModel {
        user_id: Set(teacher.id),
        school_id: Set(school_id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(TeacherResponse::new(teacher, school_id)),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Teachers",
    operation_id = "listTeachers",
    summary = "List the director's teachers",
    description = "Returns the teachers of the calling director's school, newest first. Requires the DIRECTOR role.",
    responses(
        (status = 200, description = "List of teachers", body = Vec<TeacherResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED, FORBIDDEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(director_id = %auth_user.user_id))]
pub async fn list_teachers(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<TeacherResponse>>, AppError> {
    auth_user.require_role(Role::Director)?;
    let school_id = require_director_school(&state.db, &auth_user).await?;

    let teachers = user::Entity::find()
        .filter(user::Column::Role.eq(Role::Teacher))
        .filter(
            user::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(teacher_school::Column::UserId)
                    .from(teacher_school::Entity)
                    .and_where(teacher_school::Column::SchoolId.eq(school_id))
                    .to_owned(),
            ),
        )
        .order_by_desc(user::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(
        teachers
            .into_iter()
            .map(|t| TeacherResponse::new(t, school_id))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Teachers",
    operation_id = "getTeacher",
    summary = "Get a teacher by ID",
    description = "Returns a teacher of the calling director's school. Requires the DIRECTOR role.",
    params(("id" = Uuid, Path, description = "Teacher user ID")),
    responses(
        (status = 200, description = "Teacher details", body = TeacherResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Teacher belongs to another school (PERMISSION_DENIED, FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Teacher not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id = %id))]
pub async fn get_teacher(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeacherResponse>, AppError> {
    auth_user.require_role(Role::Director)?;
    let school_id = require_director_school(&state.db, &auth_user).await?;
    let teacher = find_teacher_in_school(&state.db, id, school_id).await?;
    Ok(Json(TeacherResponse::new(teacher, school_id)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Teachers",
    operation_id = "updateTeacher",
    summary = "Update a teacher",
    description = "Partially updates a teacher's email or name. An empty payload returns the current resource unchanged. Requires the DIRECTOR role and a teacher of the director's school.",
    params(("id" = Uuid, Path, description = "Teacher user ID")),
    request_body = UpdateTeacherRequest,
    responses(
        (status = 200, description = "Teacher updated", body = TeacherResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Teacher belongs to another school (PERMISSION_DENIED, FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Teacher not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id = %id))]
pub async fn update_teacher(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateTeacherRequest>,
) -> Result<Json<TeacherResponse>, AppError> {
    auth_user.require_role(Role::Director)?;
    validate_update_teacher(&payload)?;
    let school_id = require_director_school(&state.db, &auth_user).await?;

    if payload == UpdateTeacherRequest::default() {
        let existing = find_teacher_in_school(&state.db, id, school_id).await?;
        return Ok(Json(TeacherResponse::new(existing, school_id)));
    }

    let txn = state.db.begin().await?;
    let existing = find_teacher_in_school(&txn, id, school_id).await?;
    let mut active: user::ActiveModel = existing.into();

    if let Some(ref email) = payload.email {
        let email = normalize_email(email);
        ensure_email_available(&txn, &email, Some(id)).await?;
        active.email = Set(email);
    }
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await.map_err(email_conflict)?;
    txn.commit().await?;

    Ok(Json(TeacherResponse::new(model, school_id)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Teachers",
    operation_id = "deleteTeacher",
    summary = "Delete a teacher",
    description = "Permanently deletes a teacher with their answers, submissions and school link. Requires the DIRECTOR role and a teacher of the director's school.",
    params(("id" = Uuid, Path, description = "Teacher user ID")),
    responses(
        (status = 204, description = "Teacher deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Teacher belongs to another school (PERMISSION_DENIED, FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Teacher not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id = %id))]
pub async fn delete_teacher(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Director)?;
    let school_id = require_director_school(&state.db, &auth_user).await?;

    let txn = state.db.begin().await?;
    find_teacher_in_school(&txn, id, school_id).await?;

    answer::Entity::delete_many()
        .filter(answer::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    event_submission::Entity::delete_many()
        .filter(event_submission::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    teacher_school::Entity::delete_by_id(id).exec(&txn).await?;
    user::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
