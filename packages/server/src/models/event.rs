use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{Violations, check_name, double_option, duplicates};
use crate::entity::question::QuestionType;
use crate::entity::{event, question};
use crate::error::AppError;

pub const MAX_QUESTIONS_PER_EVENT: usize = 50;
const MAX_DESCRIPTION_LEN: usize = 2000;
const MAX_QUESTION_TEXT_LEN: usize = 1000;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateQuestionRequest {
    #[schema(example = "How satisfied are you with the curriculum?")]
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// 1-based display position.
    #[schema(example = 1)]
    pub order: i32,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[schema(example = "Q1")]
    pub name: String,
    pub description: Option<String>,
    /// Defaults to `true`.
    pub is_active: Option<bool>,
    /// 1-50 questions.
    pub questions: Vec<CreateQuestionRequest>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    /// Send `null` to clear the description.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<question::Model> for QuestionResponse {
    fn from(m: question::Model) -> Self {
        Self {
            id: m.id,
            event_id: m.event_id,
            text: m.text,
            question_type: m.question_type,
            order: m.position,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Event with its questions ordered by `order`.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: Uuid,
    #[schema(example = "Q1")]
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub questions: Vec<QuestionResponse>,
}

impl EventResponse {
    pub fn new(m: event::Model, questions: Vec<question::Model>) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
            questions: questions.into_iter().map(QuestionResponse::from).collect(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventListItem {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub question_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventListItem {
    pub fn new(m: event::Model, question_count: u64) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            is_active: m.is_active,
            question_count,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn check_description(v: &mut Violations, description: Option<&str>) {
    if let Some(description) = description {
        v.check(
            description.chars().count() <= MAX_DESCRIPTION_LEN,
            "description",
            "must be at most 2000 characters",
        );
    }
}

pub fn validate_create_event(req: &CreateEventRequest) -> Result<(), AppError> {
    let mut v = Violations::new();
    check_name(&mut v, "name", &req.name);
    check_description(&mut v, req.description.as_deref());

    if req.questions.is_empty() || req.questions.len() > MAX_QUESTIONS_PER_EVENT {
        v.add("questions", "must contain between 1 and 50 questions");
    }
    for (i, q) in req.questions.iter().enumerate() {
        let text = q.text.trim();
        if text.is_empty() {
            v.add(&format!("questions[{i}].text"), "must not be empty");
        } else if text.chars().count() > MAX_QUESTION_TEXT_LEN {
            v.add(&format!("questions[{i}].text"), "must be at most 1000 characters");
        }
        if q.order < 1 {
            v.add(&format!("questions[{i}].order"), "must be at least 1");
        }
    }

    let orders: Vec<i32> = req.questions.iter().map(|q| q.order).collect();
    let repeated = duplicates(&orders);
    if !repeated.is_empty() {
        let list: Vec<String> = repeated.iter().map(i32::to_string).collect();
        v.add("questions", format!("duplicate order values: {}", list.join(", ")));
    }

    v.finish()
}

pub fn validate_update_event(req: &UpdateEventRequest) -> Result<(), AppError> {
    let mut v = Violations::new();
    if let Some(ref name) = req.name {
        check_name(&mut v, "name", name);
    }
    if let Some(Some(ref description)) = req.description {
        check_description(&mut v, Some(description));
    }
    v.finish()
}
