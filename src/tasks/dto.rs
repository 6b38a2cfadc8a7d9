use serde::{Deserialize, Serialize};
use time::Date;

use super::model::{TaskPriority, TaskStatus};

/// Body for creating a task. Status is not accepted here: new tasks
/// always start out pending.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<Date>,
}

/// Body for a full-field task update.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<Date>,
}

/// Body for the quick in-place status toggle.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

/// Response of the quick status toggle.
#[derive(Debug, Serialize)]
pub struct StatusUpdateResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Optional status restriction for task listings.
#[derive(Debug, Deserialize)]
pub struct ListFilter {
    pub status: Option<TaskStatus>,
}
