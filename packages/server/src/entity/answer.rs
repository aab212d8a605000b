use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed option set for multiple-choice questions.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum MultipleChoiceOption {
    #[sea_orm(string_value = "YES")]
    #[serde(rename = "YES")]
    Yes,
    #[sea_orm(string_value = "NO")]
    #[serde(rename = "NO")]
    No,
    #[sea_orm(string_value = "OPTION_30_70")]
    #[serde(rename = "OPTION_30_70")]
    Option30To70,
    #[sea_orm(string_value = "OPTION_70_30")]
    #[serde(rename = "OPTION_70_30")]
    Option70To30,
    #[sea_orm(string_value = "OPTION_50_50")]
    #[serde(rename = "OPTION_50_50")]
    Option50To50,
    #[sea_orm(string_value = "I_DONT_KNOW")]
    #[serde(rename = "I_DONT_KNOW")]
    IDontKnow,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "answer")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub answer_text: Option<String>,
    pub selected_option: Option<MultipleChoiceOption>,

    pub user_id: Uuid,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub question_id: Uuid,
    #[sea_orm(belongs_to, from = "question_id", to = "id")]
    pub question: HasOne<super::question::Entity>,

    pub event_id: Uuid,
    #[sea_orm(belongs_to, from = "event_id", to = "id")]
    pub event: HasOne<super::event::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
