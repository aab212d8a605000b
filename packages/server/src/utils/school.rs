use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, SqlErr};
use uuid::Uuid;

use crate::entity::user::Role;
use crate::entity::{director_school, event, school, teacher_school, user};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

/// Look up a school by ID, returning 404 if not found.
pub async fn find_school<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<school::Model, AppError> {
    school::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("School not found".into()))
}

/// Look up an event by ID, returning 404 if not found.
pub async fn find_event<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Look up a user that must hold `role`. Users with another role are reported
/// as missing so IDs of other account kinds cannot be probed.
pub async fn find_user_with_role<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    role: Role,
) -> Result<user::Model, AppError> {
    let not_found = || {
        AppError::NotFound(match role {
            Role::Admin => "Admin not found".into(),
            Role::Director => "Director not found".into(),
            Role::Teacher => "Teacher not found".into(),
        })
    };
    let user = user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    if user.role != role {
        return Err(not_found());
    }
    Ok(user)
}

pub async fn director_school_id<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Option<Uuid>, DbErr> {
    Ok(director_school::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .map(|link| link.school_id))
}

pub async fn teacher_school_id<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Option<Uuid>, DbErr> {
    Ok(teacher_school::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .map(|link| link.school_id))
}

/// School the user is linked to through the link table for their role.
/// Admins have none.
pub async fn school_id_for<C: ConnectionTrait>(
    db: &C,
    user: &user::Model,
) -> Result<Option<Uuid>, DbErr> {
    match user.role {
        Role::Admin => Ok(None),
        Role::Director => director_school_id(db, user.id).await,
        Role::Teacher => teacher_school_id(db, user.id).await,
    }
}

/// Resolve the calling director's school from the link table.
///
/// The token's `school_id` is never trusted here; a director whose link was
/// removed after login gets 403.
pub async fn require_director_school<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
) -> Result<Uuid, AppError> {
    director_school_id(db, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Director is not assigned to a school".into()))
}

/// Load a teacher and check they belong to `school_id`.
/// Missing teacher is 404, a teacher of another school is 403.
pub async fn find_teacher_in_school<C: ConnectionTrait>(
    db: &C,
    teacher_id: Uuid,
    school_id: Uuid,
) -> Result<user::Model, AppError> {
    let teacher = find_user_with_role(db, teacher_id, Role::Teacher).await?;
    if teacher_school_id(db, teacher.id).await? != Some(school_id) {
        return Err(AppError::Forbidden(
            "Teacher does not belong to your school".into(),
        ));
    }
    Ok(teacher)
}

/// Return 409 `EMAIL_TAKEN` when another account already uses `email`.
pub async fn ensure_email_available<C: ConnectionTrait>(
    db: &C,
    email: &str,
    except: Option<Uuid>,
) -> Result<(), AppError> {
    let mut query = user::Entity::find().filter(user::Column::Email.eq(email));
    if let Some(id) = except {
        query = query.filter(user::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(AppError::EmailTaken);
    }
    Ok(())
}

/// Map a unique violation raised by a user write to `EMAIL_TAKEN`.
pub fn email_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Email race condition: unique constraint caught on write");
            AppError::EmailTaken
        }
        _ => AppError::from(err),
    }
}
