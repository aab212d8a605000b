use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{Violations, check_email};
use crate::entity::user::{self, Role};
use crate::error::AppError;

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Account email (case-insensitive).
    #[schema(example = "director@test.com")]
    pub email: String,
    /// Account password.
    #[schema(example = "Director123!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    let mut v = Violations::new();
    check_email(&mut v, "email", &payload.email);
    v.check(!payload.password.is_empty(), "password", "must not be empty");
    v.finish()
}

/// Public profile embedded in the login response.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: Uuid,
    #[schema(example = "director@test.com")]
    pub email: String,
    #[schema(example = "Jane Director")]
    pub name: String,
    pub role: Role,
    /// Linked school for directors and teachers.
    pub school_id: Option<Uuid>,
}

impl LoginUser {
    pub fn new(user: user::Model, school_id: Option<Uuid>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            school_id,
        }
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    pub user: LoginUser,
}

/// The session carried by the caller's token.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub school_id: Option<Uuid>,
}
