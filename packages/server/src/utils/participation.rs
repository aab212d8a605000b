use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entity::answer::{self, MultipleChoiceOption};
use crate::entity::question::{self, QuestionType};

/// One stored answer joined with the question it responds to.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRow {
    pub answer_id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub question_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub question_order: i32,
    pub answer_text: Option<String>,
    pub selected_option: Option<MultipleChoiceOption>,
    pub answered_at: DateTime<Utc>,
}

impl AnswerRow {
    pub fn new(answer: answer::Model, question: question::Model) -> Self {
        Self {
            answer_id: answer.id,
            user_id: answer.user_id,
            event_id: answer.event_id,
            question_id: answer.question_id,
            question_text: question.text,
            question_type: question.question_type,
            question_order: question.position,
            answer_text: answer.answer_text,
            selected_option: answer.selected_option,
            answered_at: answer.created_at,
        }
    }
}

/// A user's answers for a single event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventParticipation {
    pub event_id: Uuid,
    /// Earliest answer timestamp.
    pub participated_at: DateTime<Utc>,
    /// Distinct questions answered.
    pub answered_questions: u64,
    /// Answers ordered by question order.
    pub answers: Vec<AnswerRow>,
}

/// Group answers by event, newest participation first.
pub fn group_by_event(rows: Vec<AnswerRow>) -> Vec<EventParticipation> {
    let mut by_event: BTreeMap<Uuid, Vec<AnswerRow>> = BTreeMap::new();
    for row in rows {
        by_event.entry(row.event_id).or_default().push(row);
    }

    let mut groups: Vec<EventParticipation> = by_event
        .into_iter()
        .filter_map(|(event_id, answers)| {
            summarize(answers).map(|(participated_at, answered, answers)| EventParticipation {
                event_id,
                participated_at,
                answered_questions: answered,
                answers,
            })
        })
        .collect();

    groups.sort_by(|a, b| {
        b.participated_at
            .cmp(&a.participated_at)
            .then_with(|| a.event_id.cmp(&b.event_id))
    });
    groups
}

/// One user's answers within a single event.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAnswers {
    pub user_id: Uuid,
    pub answered_questions: u64,
    pub answers: Vec<AnswerRow>,
}

/// Group one event's answers by the answering user. Order follows user ID;
/// callers re-sort by display name.
pub fn group_by_user(rows: Vec<AnswerRow>) -> Vec<UserAnswers> {
    let mut by_user: BTreeMap<Uuid, Vec<AnswerRow>> = BTreeMap::new();
    for row in rows {
        by_user.entry(row.user_id).or_default().push(row);
    }

    by_user
        .into_iter()
        .filter_map(|(user_id, answers)| {
            summarize(answers).map(|(_, answered, answers)| UserAnswers {
                user_id,
                answered_questions: answered,
                answers,
            })
        })
        .collect()
}

fn summarize(mut answers: Vec<AnswerRow>) -> Option<(DateTime<Utc>, u64, Vec<AnswerRow>)> {
    let first = answers.iter().map(|a| a.answered_at).min()?;
    let distinct = answers
        .iter()
        .map(|a| a.question_id)
        .collect::<HashSet<_>>()
        .len() as u64;
    answers.sort_by(|a, b| {
        a.question_order
            .cmp(&b.question_order)
            .then_with(|| a.question_id.cmp(&b.question_id))
    });
    Some((first, distinct, answers))
}
