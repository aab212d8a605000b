use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "school")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,
    pub address: Option<String>,

    /// Administrator who created the school.
    pub admin_id: Uuid,
    #[sea_orm(belongs_to, from = "admin_id", to = "id")]
    pub admin: HasOne<super::user::Entity>,

    #[sea_orm(has_many)]
    pub directors: HasMany<super::director_school::Entity>,

    #[sea_orm(has_many)]
    pub teachers: HasMany<super::teacher_school::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
