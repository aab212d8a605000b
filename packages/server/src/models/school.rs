use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{Violations, check_name, double_option};
use crate::error::AppError;

const MAX_ADDRESS_LEN: usize = 512;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSchoolRequest {
    /// School name (2-256 characters).
    #[schema(example = "Test School")]
    pub name: String,
    /// Postal address.
    #[schema(example = "1 Main Street")]
    pub address: Option<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateSchoolRequest {
    pub name: Option<String>,
    /// Send `null` to clear the address.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchoolResponse {
    pub id: Uuid,
    #[schema(example = "Test School")]
    pub name: String,
    pub address: Option<String>,
    /// Administrator who created the school.
    pub admin_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::school::Model> for SchoolResponse {
    fn from(m: crate::entity::school::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            address: m.address,
            admin_id: m.admin_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn check_address(v: &mut Violations, address: Option<&str>) {
    if let Some(address) = address {
        v.check(
            address.chars().count() <= MAX_ADDRESS_LEN,
            "address",
            "must be at most 512 characters",
        );
    }
}

pub fn validate_create_school(req: &CreateSchoolRequest) -> Result<(), AppError> {
    let mut v = Violations::new();
    check_name(&mut v, "name", &req.name);
    check_address(&mut v, req.address.as_deref());
    v.finish()
}

pub fn validate_update_school(req: &UpdateSchoolRequest) -> Result<(), AppError> {
    let mut v = Violations::new();
    if let Some(ref name) = req.name {
        check_name(&mut v, "name", name);
    }
    if let Some(Some(ref address)) = req.address {
        check_address(&mut v, Some(address));
    }
    v.finish()
}
