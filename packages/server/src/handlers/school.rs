use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::user::Role;
use crate::entity::{answer, director_school, event_submission, school, teacher_school, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::school::*;
use crate::models::shared::trim_optional;
use crate::state::AppState;
use crate::utils::school::find_school;

#[utoipa::path(
    post,
    path = "/",
    tag = "Schools",
    operation_id = "createSchool",
    summary = "Create a school",
    description = "Creates a school owned by the calling administrator. Requires the ADMIN role.",
    request_body = CreateSchoolRequest,
    responses(
        (status = 201, description = "School created", body = SchoolResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_school(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSchoolRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Admin)?;
    validate_create_school(&payload)?;

    let now = chrono::Utc::now();
    let new_school = school::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(payload.name.trim().to_string()),
        address: Set(trim_optional(payload.address)),
        admin_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_school.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(SchoolResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Schools",
    operation_id = "listSchools",
    summary = "List schools",
    description = "Returns every school, newest first. Requires the ADMIN role.",
    responses(
        (status = 200, description = "List of schools", body = Vec<SchoolResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_schools(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SchoolResponse>>, AppError> {
    auth_user.require_role(Role::Admin)?;

    let schools = school::Entity::find()
        .order_by_desc(school::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(schools.into_iter().map(SchoolResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Schools",
    operation_id = "getSchool",
    summary = "Get a school by ID",
    description = "Returns a single school. Requires the ADMIN role.",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 200, description = "School details", body = SchoolResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "School not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id = %id))]
pub async fn get_school(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SchoolResponse>, AppError> {
    auth_user.require_role(Role::Admin)?;
    let model = find_school(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Schools",
    operation_id = "updateSchool",
    summary = "Update a school",
    description = "Partially updates a school's name or address. An empty payload returns the current resource unchanged. Requires the ADMIN role.",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = UpdateSchoolRequest,
    responses(
        (status = 200, description = "School updated", body = SchoolResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "School not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id = %id))]
pub async fn update_school(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateSchoolRequest>,
) -> Result<Json<SchoolResponse>, AppError> {
    auth_user.require_role(Role::Admin)?;
    validate_update_school(&payload)?;

    if payload == UpdateSchoolRequest::default() {
        let existing = find_school(&state.db, id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_school(&txn, id).await?;
    let mut active: school::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(address) = payload.address {
        active.address = Set(trim_optional(address));
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Schools",
    operation_id = "deleteSchool",
    summary = "Delete a school",
    description = "Permanently deletes a school together with its director and teacher accounts, their answers and submissions. Requires the ADMIN role.",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 204, description = "School deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "School not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id = %id))]
pub async fn delete_school(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Admin)?;

    let txn = state.db.begin().await?;
    find_school(&txn, id).await?;

    let director_ids: Vec<Uuid> = director_school::Entity::find()
        .filter(director_school::Column::SchoolId.eq(id))
        .select_only()
        .column(director_school::Column::UserId)
        .into_tuple()
        .all(&txn)
        .await?;
    let teacher_ids: Vec<Uuid> = teacher_school::Entity::find()
        .filter(teacher_school::Column::SchoolId.eq(id))
        .select_only()
        .column(teacher_school::Column::UserId)
        .into_tuple()
        .all(&txn)
        .await?;
    let member_ids: Vec<Uuid> = director_ids.iter().chain(&teacher_ids).copied().collect();

    answer::Entity::delete_many()
        .filter(answer::Column::UserId.is_in(member_ids.clone()))
        .exec(&txn)
        .await?;
    event_submission::Entity::delete_many()
        .filter(event_submission::Column::UserId.is_in(member_ids.clone()))
        .exec(&txn)
        .await?;
    director_school::Entity::delete_many()
        .filter(director_school::Column::SchoolId.eq(id))
        .exec(&txn)
        .await?;
    teacher_school::Entity::delete_many()
        .filter(teacher_school::Column::SchoolId.eq(id))
        .exec(&txn)
        .await?;
    user::Entity::delete_many()
        .filter(user::Column::Id.is_in(member_ids))
        .exec(&txn)
        .await?;
    school::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        directors = director_ids.len(),
        teachers = teacher_ids.len(),
        "School deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
