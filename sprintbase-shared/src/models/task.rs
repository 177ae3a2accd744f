/// Task model and database operations
///
/// Tasks are the smallest unit of work; each belongs to exactly one story
/// and may carry an assignee. No ordering invariant beyond that.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     story_id UUID NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     done BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use crate::models::patch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Story this task belongs to
    pub story_id: Uuid,

    /// Assigned user, if any
    pub assignee_id: Option<Uuid>,

    /// Task title
    pub title: String,

    /// Longer description
    pub description: Option<String>,

    /// Completion flag
    pub done: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    /// Story to attach the task to
    pub story_id: Uuid,

    /// Task title
    pub title: String,

    /// Longer description
    pub description: Option<String>,

    /// Assigned user
    pub assignee_id: Option<Uuid>,
}

/// Input for updating a task (partial; absent fields are untouched)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description, or null to clear
    #[serde(default, deserialize_with = "patch::double_option")]
    pub description: Option<Option<String>>,

    /// New assignee, or null to unassign
    #[serde(default, deserialize_with = "patch::double_option")]
    pub assignee_id: Option<Option<Uuid>>,

    /// New completion flag
    pub done: Option<bool>,
}

impl Task {
    /// Creates a new task under a story
    ///
    /// # Errors
    ///
    /// Returns an error if the story does not exist (foreign key
    /// violation) or the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (story_id, title, description, assignee_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, story_id, assignee_id, title, description, done, created_at
            "#,
        )
        .bind(data.story_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.assignee_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, story_id, assignee_id, title, description, done, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists the tasks of a story in creation order
    pub async fn list_by_story(pool: &PgPool, story_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, story_id, assignee_id, title, description, done, created_at
            FROM tasks
            WHERE story_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(story_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Applies a partial update; absent fields keep their prior values
    ///
    /// Returns None if the task does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(mut task) = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, story_id, assignee_id, title, description, done, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        if let Some(title) = data.title {
            task.title = title;
        }
        if let Some(description) = data.description {
            task.description = description;
        }
        if let Some(assignee_id) = data.assignee_id {
            task.assignee_id = assignee_id;
        }
        if let Some(done) = data.done {
            task.done = done;
        }

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $2,
                description = $3,
                assignee_id = $4,
                done = $5
            WHERE id = $1
            RETURNING id, story_id, assignee_id, title, description, done, created_at
            "#,
        )
        .bind(task.id)
        .bind(task.title)
        .bind(task.description)
        .bind(task.assignee_id)
        .bind(task.done)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(task))
    }

    /// Atomically flips the done flag
    ///
    /// One UPDATE statement, so each call flips exactly once.
    pub async fn toggle_done(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET done = NOT done
            WHERE id = $1
            RETURNING id, story_id, assignee_id, title, description, done, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
