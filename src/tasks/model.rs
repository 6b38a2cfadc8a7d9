use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Lifecycle state of a task. Transitions are unconstrained: any state may
/// be set from any other, including completed back to pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

/// Task record in the database. Every task is owned by exactly one user;
/// all queries touching this table filter by `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<Date>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Per-status counts over a user's tasks, computed from the live table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TaskStats {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
}

/// Richer aggregate view over a user's tasks.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DetailedTaskStats {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub overdue: i64,
    pub high_priority: i64,
    pub avg_completion_days: Option<f64>,
    pub first_task_at: Option<OffsetDateTime>,
    pub latest_task_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Urgency {
    Overdue,
    DueToday,
    Normal,
}

/// A task that needs attention, annotated with how urgent it is relative
/// to today.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AttentionTask {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<Date>,
    pub created_at: OffsetDateTime,
    pub urgency: Urgency,
    pub days_until_due: Option<i64>,
}
