use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{Violations, check_account_update, check_new_account};
use crate::entity::user;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDirectorRequest {
    #[schema(example = "director@test.com")]
    pub email: String,
    /// Initial password (8-128 characters).
    #[schema(example = "Director123!")]
    pub password: String,
    #[schema(example = "Jane Director")]
    pub name: String,
    /// School the director will manage.
    pub school_id: Uuid,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateDirectorRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DirectorListQuery {
    /// Only list directors of this school.
    pub school_id: Option<Uuid>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectorResponse {
    pub id: Uuid,
    #[schema(example = "director@test.com")]
    pub email: String,
    #[schema(example = "Jane Director")]
    pub name: String,
    pub school_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DirectorResponse {
    pub fn new(user: user::Model, school_id: Option<Uuid>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            school_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

pub fn validate_create_director(req: &CreateDirectorRequest) -> Result<(), AppError> {
    let mut v = Violations::new();
    check_new_account(&mut v, &req.email, &req.password, &req.name);
    v.finish()
}

pub fn validate_update_director(req: &UpdateDirectorRequest) -> Result<(), AppError> {
    let mut v = Violations::new();
    check_account_update(&mut v, req.email.as_deref(), req.name.as_deref());
    v.finish()
}
