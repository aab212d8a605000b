use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{Violations, duplicates};
use crate::entity::answer::{self, MultipleChoiceOption};
use crate::entity::question::QuestionType;
use crate::error::AppError;
use crate::utils::participation::AnswerRow;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerItem {
    pub question_id: Uuid,
    /// Required for `FREE_TEXT` questions.
    pub answer_text: Option<String>,
    /// Required for `MULTIPLE_CHOICE` questions.
    pub selected_option: Option<MultipleChoiceOption>,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswersRequest {
    pub event_id: Uuid,
    /// One answer per question of the event.
    pub answers: Vec<SubmitAnswerItem>,
}

pub fn validate_submit_request(req: &SubmitAnswersRequest) -> Result<(), AppError> {
    let mut v = Violations::new();
    v.check(!req.answers.is_empty(), "answers", "must not be empty");
    v.finish()
}

fn id_list(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(", ")
}

/// Check a submission against the event's question IDs.
///
/// Runs after the event and prior-submission checks. Checks, in order:
/// answer count equals question count, every question ID belongs to the
/// event, and no question is answered twice. Either answer field may be
/// left out for any question type.
pub fn validate_submission(
    answers: &[SubmitAnswerItem],
    question_ids: &[Uuid],
) -> Result<(), AppError> {
    if answers.len() != question_ids.len() {
        return Err(AppError::Validation(format!(
            "answers: you must answer all {} questions",
            question_ids.len()
        )));
    }

    let known: HashSet<Uuid> = question_ids.iter().copied().collect();

    let ids: Vec<Uuid> = answers.iter().map(|a| a.question_id).collect();
    let invalid: Vec<Uuid> = ids.iter().copied().filter(|id| !known.contains(id)).collect();
    if !invalid.is_empty() {
        return Err(AppError::Validation(format!(
            "answers: invalid question IDs for this event: {}",
            id_list(&invalid)
        )));
    }

    let repeated = duplicates(&ids);
    if !repeated.is_empty() {
        return Err(AppError::Validation(format!(
            "answers: duplicate question IDs: {}",
            id_list(&repeated)
        )));
    }

    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub event_id: Uuid,
    pub answer_text: Option<String>,
    pub selected_option: Option<MultipleChoiceOption>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<answer::Model> for AnswerResponse {
    fn from(m: answer::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            question_id: m.question_id,
            event_id: m.event_id,
            answer_text: m.answer_text,
            selected_option: m.selected_option,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmitAnswersResponse {
    #[schema(example = "Answers submitted successfully")]
    pub message: String,
    pub answers: Vec<AnswerResponse>,
}

/// An answer joined with its question.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDetail {
    pub question_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub question_order: i32,
    pub answer_text: Option<String>,
    pub selected_option: Option<MultipleChoiceOption>,
    pub submitted_at: DateTime<Utc>,
}

impl From<AnswerRow> for AnswerDetail {
    fn from(row: AnswerRow) -> Self {
        Self {
            question_id: row.question_id,
            question_text: row.question_text,
            question_type: row.question_type,
            question_order: row.question_order,
            answer_text: row.answer_text,
            selected_option: row.selected_option,
            submitted_at: row.answered_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyAnswersResponse {
    pub event_id: Uuid,
    pub event_name: String,
    pub answers: Vec<AnswerDetail>,
}

/// One answer in the caller's flat history.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub answer_id: Uuid,
    pub event_id: Uuid,
    pub event_name: String,
    pub question_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub answer_text: Option<String>,
    pub selected_option: Option<MultipleChoiceOption>,
    pub submitted_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(row: AnswerRow, event_name: String) -> Self {
        Self {
            answer_id: row.answer_id,
            event_id: row.event_id,
            event_name,
            question_id: row.question_id,
            question_text: row.question_text,
            question_type: row.question_type,
            answer_text: row.answer_text,
            selected_option: row.selected_option,
            submitted_at: row.answered_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipatedEventResponse {
    pub event_id: Uuid,
    #[schema(example = "Q1")]
    pub event_name: String,
    pub event_description: Option<String>,
    pub is_active: bool,
    pub answered_questions_count: u64,
    pub total_questions_count: u64,
    pub participated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherResult {
    pub teacher_id: Uuid,
    pub teacher_name: String,
    pub teacher_email: String,
    pub answered_questions_count: u64,
    pub total_questions_count: u64,
    pub answers: Vec<AnswerDetail>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchoolResultsResponse {
    pub event_id: Uuid,
    pub event_name: String,
    pub school_id: Uuid,
    pub total_questions_count: u64,
    /// Teachers of the school who answered, ordered by name.
    pub teachers: Vec<TeacherResult>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherEventHistory {
    pub event_id: Uuid,
    pub event_name: String,
    pub event_description: Option<String>,
    pub is_active: bool,
    pub answered_questions_count: u64,
    pub total_questions_count: u64,
    pub participated_at: DateTime<Utc>,
    pub answers: Vec<AnswerDetail>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherHistoryResponse {
    pub teacher_id: Uuid,
    pub teacher_name: String,
    pub teacher_email: String,
    /// Newest participation first.
    pub events: Vec<TeacherEventHistory>,
}
