use time::{Date, OffsetDateTime};

use crate::error::FieldError;

pub const TITLE_MAX_CHARS: usize = 255;

/// Trim and validate a task title: required, at most 255 characters.
/// Returns the trimmed title; problems are appended to `errors`.
pub fn checked_title(title: &str, errors: &mut Vec<FieldError>) -> String {
    let title = title.trim();
    if title.is_empty() {
        errors.push(FieldError::new("title", "Title is required"));
    } else if title.chars().count() > TITLE_MAX_CHARS {
        errors.push(FieldError::new(
            "title",
            "Title must not exceed 255 characters",
        ));
    }
    title.to_string()
}

/// A task's due date, when given, must be today (UTC) or later.
pub fn check_due_date_not_past(due_date: Option<Date>, errors: &mut Vec<FieldError>) {
    if let Some(date) = due_date {
        if date < OffsetDateTime::now_utc().date() {
            errors.push(FieldError::new("due_date", "Due date must be today or later"));
        }
    }
}
