use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{Violations, check_account_update, check_new_account};
use crate::entity::user;
use crate::error::AppError;

/// New teacher. The school is taken from the calling director.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTeacherRequest {
    #[schema(example = "teacher@test.com")]
    pub email: String,
    #[schema(example = "Teacher123!")]
    pub password: String,
    #[schema(example = "Tom Teacher")]
    pub name: String,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateTeacherRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherResponse {
    pub id: Uuid,
    #[schema(example = "teacher@test.com")]
    pub email: String,
    #[schema(example = "Tom Teacher")]
    pub name: String,
    pub school_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeacherResponse {
    pub fn new(user: user::Model, school_id: Uuid) -> Self {
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

pub fn validate_create_teacher(req: &CreateTeacherRequest) -> Result<(), AppError> {
    let mut v = Violations::new();
    check_new_account(&mut v, &req.email, &req.password, &req.name);
    v.finish()
}

pub fn validate_update_teacher(req: &UpdateTeacherRequest) -> Result<(), AppError> {
    let mut v = Violations::new();
    check_account_update(&mut v, req.email.as_deref(), req.name.as_deref());
    v.finish()
}
