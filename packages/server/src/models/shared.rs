use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// Collects per-field validation failures so a single 400 lists all of them.
#[derive(Debug, Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, problem: impl std::fmt::Display) {
        self.0.push(format!("{field}: {problem}"));
    }

    /// Record `problem` against `field` when `check` fails.
    pub fn check(&mut self, ok: bool, field: &str, problem: &str) {
        if !ok {
            self.add(field, problem);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0.join("; ")))
        }
    }
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Structural email check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() || email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Names are trimmed and must hold 2-256 characters.
pub fn check_name(v: &mut Violations, field: &str, name: &str) {
    let count = name.trim().chars().count();
    if count < 2 {
        v.add(field, "must be at least 2 characters");
    } else if count > 256 {
        v.add(field, "must be at most 256 characters");
    }
}

pub fn check_email(v: &mut Violations, field: &str, email: &str) {
    v.check(is_valid_email(email), field, "must be a valid email address");
}

pub fn check_password(v: &mut Violations, field: &str, password: &str) {
    v.check(
        (8..=128).contains(&password.len()),
        field,
        "must be 8-128 characters",
    );
}

/// Field checks shared by director and teacher account creation.
pub fn check_new_account(v: &mut Violations, email: &str, password: &str, name: &str) {
    check_email(v, "email", email);
    check_password(v, "password", password);
    check_name(v, "name", name);
}

/// Field checks shared by director and teacher PATCH bodies.
pub fn check_account_update(v: &mut Violations, email: Option<&str>, name: Option<&str>) {
    if let Some(email) = email {
        check_email(v, "email", email);
    }
    if let Some(name) = name {
        check_name(v, "name", name);
    }
}

/// Return each value that occurs more than once, in first-repeat order.
pub fn duplicates<T: Eq + Hash + Copy>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    items
        .iter()
        .copied()
        .filter(|item| !seen.insert(*item) && reported.insert(*item))
        .collect()
}

/// Trim an optional free-form string, mapping blank input to `None`.
pub fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
