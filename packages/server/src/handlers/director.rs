use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::user::Role;
use crate::entity::{director_school, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::director::*;
use crate::models::shared::normalize_email;
use crate::state::AppState;
use crate::utils::hash;
use crate::utils::school::{
    director_school_id, email_conflict, ensure_email_available, find_school, find_user_with_role,
};

#[utoipa::path(
    post,
    path = "/",
    tag = "Directors",
    operation_id = "createDirector",
    summary = "Create a director",
    description = "Creates a director account and links it to an existing school. Requires the ADMIN role.",
    request_body = CreateDirectorRequest,
    responses(
        (status = 201, description = "Director created", body = DirectorResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "School not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(email = %payload.email, school_id = %payload.school_id))]
pub async fn create_director(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateDirectorRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Admin)?;
    validate_create_director(&payload)?;

    let email = normalize_email(&payload.email);
    let password = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let txn = state.db.begin().await?;
    find_school(&txn, payload.school_id).await?;
    ensure_email_available(&txn, &email, None).await?;

    let now = chrono::Utc::now();
    let director = user::ActiveModel {
        id: Set(Uuid::now_v7()),
        email: Set(email),
        password: Set(password),
        name: Set(payload.name.trim().to_string()),
        role: Set(Role::Director),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(email_conflict)?;

    director_school::ActiveModel {
        user_id: Set(director.id),
        school_id: Set(payload.school_id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(DirectorResponse::new(director, Some(payload.school_id))),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Directors",
    operation_id = "listDirectors",
    summary = "List directors",
    description = "Returns directors, newest first, optionally restricted to one school. Requires the ADMIN role.",
    params(DirectorListQuery),
    responses(
        (status = 200, description = "List of directors", body = Vec<DirectorResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "School not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_directors(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DirectorListQuery>,
) -> Result<Json<Vec<DirectorResponse>>, AppError> {
    auth_user.require_role(Role::Admin)?;

    let mut links = director_school::Entity::find();
    if let Some(school_id) = query.school_id {
        find_school(&state.db, school_id).await?;
        links = links.filter(director_school::Column::SchoolId.eq(school_id));
    }
    let schools: HashMap<Uuid, Uuid> = links
        .all(&state.db)
        .await?
        .into_iter()
        .map(|link| (link.user_id, link.school_id))
        .collect();

    let mut select = user::Entity::find().filter(user::Column::Role.eq(Role::Director));
    if query.school_id.is_some() {
        select = select.filter(user::Column::Id.is_in(schools.keys().copied().collect::<Vec<_>>()));
    }
    let directors = select
        .order_by_desc(user::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(
        directors
            .into_iter()
            .map(|d| {
                let school_id = schools.get(&d.id).copied();
                DirectorResponse::new(d, school_id)
            })
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Directors",
    operation_id = "getDirector",
    summary = "Get a director by ID",
    description = "Returns a director and their school. Requires the ADMIN role.",
    params(("id" = Uuid, Path, description = "Director user ID")),
    responses(
        (status = 200, description = "Director details", body = DirectorResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Director not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id = %id))]
pub async fn get_director(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DirectorResponse>, AppError> {
    auth_user.require_role(Role::Admin)?;
    let director = find_user_with_role(&state.db, id, Role::Director).await?;
    let school_id = director_school_id(&state.db, id).await?;
    Ok(Json(DirectorResponse::new(director, school_id)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Directors",
    operation_id = "updateDirector",
    summary = "Update a director",
    description = "Partially updates a director's email or name. An empty payload returns the current resource unchanged. Requires the ADMIN role.",
    params(("id" = Uuid, Path, description = "Director user ID")),
    request_body = UpdateDirectorRequest,
    responses(
        (status = 200, description = "Director updated", body = DirectorResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Director not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id = %id))]
pub async fn update_director(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateDirectorRequest>,
) -> Result<Json<DirectorResponse>, AppError> {
    auth_user.require_role(Role::Admin)?;
    validate_update_director(&payload)?;

    if payload == UpdateDirectorRequest::default() {
        let existing = find_user_with_role(&state.db, id, Role::Director).await?;
        let school_id = director_school_id(&state.db, id).await?;
        return Ok(Json(DirectorResponse::new(existing, school_id)));
    }

    let txn = state.db.begin().await?;
    let existing = find_user_with_role(&txn, id, Role::Director).await?;
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
    let school_id = director_school_id(&txn, id).await?;
    txn.commit().await?;

    Ok(Json(DirectorResponse::new(model, school_id)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Directors",
    operation_id = "deleteDirector",
    summary = "Delete a director",
    description = "Permanently deletes a director and their school link. Requires the ADMIN role.",
    params(("id" = Uuid, Path, description = "Director user ID")),
    responses(
        (status = 204, description = "Director deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Director not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id = %id))]
pub async fn delete_director(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(Role::Admin)?;

    let txn = state.db.begin().await?;
    find_user_with_role(&txn, id, Role::Director).await?;

    director_school::Entity::delete_by_id(id).exec(&txn).await?;
    user::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
