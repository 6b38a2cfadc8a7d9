use sqlx::SqlitePool;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::model::{
    AttentionTask, DetailedTaskStats, Task, TaskPriority, TaskStats, TaskStatus,
};

/// Validated fields for inserting a task. Status is not part of this:
/// new tasks always start out pending.
#[derive(Debug)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<Date>,
}

/// Validated fields for a full-field update.
#[derive(Debug)]
pub struct TaskChanges {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<Date>,
}

impl Task {
    pub async fn create(db: &SqlitePool, user_id: Uuid, new: NewTask) -> sqlx::Result<Task> {
        let now = OffsetDateTime::now_utc();
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, user_id, title, description, status, priority, due_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, user_id, title, description, status, priority, due_date, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(TaskStatus::Pending)
        .bind(new.priority)
        .bind(new.due_date)
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await
    }

    /// All of the user's tasks, newest first, optionally restricted to one
    /// status.
    pub async fn list_by_user(
        db: &SqlitePool,
        user_id: Uuid,
        status: Option<TaskStatus>,
    ) -> sqlx::Result<Vec<Task>> {
        match status {
            Some(status) => {
                sqlx::query_as::<_, Task>(
                    r#"
                    SELECT id, user_id, title, description, status, priority, due_date, created_at, updated_at
                    FROM tasks
                    WHERE user_id = ? AND status = ?
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(user_id)
                .bind(status)
                .fetch_all(db)
                .await
            }
            None => {
                sqlx::query_as::<_, Task>(
                    r#"
                    SELECT id, user_id, title, description, status, priority, due_date, created_at, updated_at
                    FROM tasks
                    WHERE user_id = ?
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(user_id)
                .fetch_all(db)
                .await
            }
        }
    }

    /// `None` both when the row is absent and when it belongs to another
    /// user; callers cannot tell the two apart.
    pub async fn get(db: &SqlitePool, user_id: Uuid, id: Uuid) -> sqlx::Result<Option<Task>> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, priority, due_date, created_at, updated_at
            FROM tasks
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Full-field update. `None` when the task is not owned by `user_id`.
    pub async fn update(
        db: &SqlitePool,
        user_id: Uuid,
        id: Uuid,
        changes: TaskChanges,
    ) -> sqlx::Result<Option<Task>> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = ?, description = ?, status = ?, priority = ?, due_date = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            RETURNING id, user_id, title, description, status, priority, due_date, created_at, updated_at
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.status)
        .bind(changes.priority)
        .bind(changes.due_date)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Status-only update for the quick toggle. Returns whether a row was
    /// actually touched.
    pub async fn update_status(
        db: &SqlitePool,
        user_id: Uuid,
        id: Uuid,
        status: TaskStatus,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET status = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(status)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hard delete. Returns whether a row was actually removed.
    pub async fn delete(db: &SqlitePool, user_id: Uuid, id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM tasks WHERE id = ? AND user_id = ?"#)
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Per-status counts, computed over the same table `list_by_user`
    /// reads so they are always consistent with it.
    pub async fn stats(db: &SqlitePool, user_id: Uuid) -> sqlx::Result<TaskStats> {
        sqlx::query_as::<_, TaskStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(CASE WHEN status = 'pending' THEN 1 END) AS pending,
                COUNT(CASE WHEN status = 'in_progress' THEN 1 END) AS in_progress,
                COUNT(CASE WHEN status = 'completed' THEN 1 END) AS completed
            FROM tasks
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(db)
        .await
    }

    /// Richer aggregates: overdue and high-priority counts, mean days from
    /// creation to completion, and the span of task creation dates.
    pub async fn detailed_stats(db: &SqlitePool, user_id: Uuid) -> sqlx::Result<DetailedTaskStats> {
        sqlx::query_as::<_, DetailedTaskStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(CASE WHEN status = 'pending' THEN 1 END) AS pending,
                COUNT(CASE WHEN status = 'in_progress' THEN 1 END) AS in_progress,
                COUNT(CASE WHEN status = 'completed' THEN 1 END) AS completed,
                COUNT(CASE WHEN due_date < date('now') AND status != 'completed' THEN 1 END) AS overdue,
                COUNT(CASE WHEN priority = 'high' THEN 1 END) AS high_priority,
                AVG(CASE WHEN status = 'completed' THEN julianday(updated_at) - julianday(created_at) END) AS avg_completion_days,
                MIN(created_at) AS first_task_at,
                MAX(created_at) AS latest_task_at
            FROM tasks
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(db)
        .await
    }

    /// Tasks that need attention: everything pending, plus high-priority
    /// work already in progress. Most urgent first.
    pub async fn needing_attention(
        db: &SqlitePool,
        user_id: Uuid,
    ) -> sqlx::Result<Vec<AttentionTask>> {
        sqlx::query_as::<_, AttentionTask>(
            r#"
            SELECT
                id, title, description, status, priority, due_date, created_at,
                CASE
                    WHEN due_date IS NOT NULL AND due_date < date('now') AND status != 'completed' THEN 'overdue'
                    WHEN due_date IS NOT NULL AND due_date = date('now') AND status != 'completed' THEN 'due_today'
                    ELSE 'normal'
                END AS urgency,
                CAST(julianday(due_date) - julianday(date('now')) AS INTEGER) AS days_until_due
            FROM tasks
            WHERE user_id = ?
              AND (status = 'pending' OR (status = 'in_progress' AND priority = 'high'))
            ORDER BY
                CASE priority WHEN 'high' THEN 1 WHEN 'medium' THEN 2 WHEN 'low' THEN 3 END,
                due_date ASC,
                created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }
}
