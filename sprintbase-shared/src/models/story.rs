/// Story model and backlog ordering operations
///
/// A story belongs to a project and optionally to one of its sprints.
/// Stories with no sprint form the project's backlog, totally ordered by
/// the integer `priority` field, highest first. The ordering is dense but
/// not contiguous except immediately after a reorder: removing a story
/// from the backlog leaves a gap, and gaps are acceptable.
///
/// # Ordering rules
///
/// - Creating a backlog story appends it with `max(priority) + 1`
///   (or 1 on an empty backlog).
/// - `reorder_backlog` rewrites priorities for exactly the given id
///   sequence: the i-th id gets `N - i`, so the first-listed story sorts
///   highest. The operation is atomic; unknown or duplicate ids, or ids
///   spanning more than one project, fail the whole call with no partial
///   write.
/// - Un-assigning a story from its sprint returns it to the backlog with
///   a fresh `max + 1` priority, mirroring backlog creation.
/// - Listings order by `priority DESC, created_at ASC`; the creation
///   timestamp is the explicit tie-breaker.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE stories (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     sprint_id UUID REFERENCES sprints(id) ON DELETE SET NULL,
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     points INTEGER CHECK (points IS NULL OR points >= 0),
///     done BOOLEAN NOT NULL DEFAULT FALSE,
///     priority INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use crate::models::patch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Error type for story and backlog operations
#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    /// Referenced project does not exist
    #[error("Project not found")]
    ProjectNotFound,

    /// Referenced sprint does not exist
    #[error("Sprint not found")]
    SprintNotFound,

    /// Referenced story does not exist
    #[error("Story not found")]
    StoryNotFound,

    /// Sprint belongs to a different project than the story
    #[error("Sprint does not belong to the story's project")]
    SprintProjectMismatch,

    /// Reorder list named ids that are not backlog stories, or named an
    /// id twice
    #[error("Reorder list contains unknown or duplicate story ids")]
    UnknownOrDuplicateIds,

    /// Reorder list named stories from more than one project
    #[error("Reorder list spans multiple projects")]
    CrossProjectReorder,

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Story model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Story {
    /// Unique story ID
    pub id: Uuid,

    /// Project this story belongs to
    pub project_id: Uuid,

    /// Sprint assignment; None means the story is in the backlog
    pub sprint_id: Option<Uuid>,

    /// Story title
    pub title: String,

    /// Longer description
    pub description: Option<String>,

    /// Estimate in points (>= 0 when set)
    pub points: Option<i32>,

    /// Completion flag
    pub done: bool,

    /// Backlog ordering key; higher sorts first
    pub priority: i32,

    /// When the story was created (tie-breaker for equal priorities)
    pub created_at: DateTime<Utc>,
}

/// Input for creating a story, optionally already assigned to a sprint
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStory {
    /// Project to create the story in
    pub project_id: Uuid,

    /// Sprint assignment; must belong to the same project when set
    pub sprint_id: Option<Uuid>,

    /// Story title
    pub title: String,

    /// Longer description
    pub description: Option<String>,

    /// Estimate in points
    pub points: Option<i32>,

    /// Explicit ordering key (defaults to 0)
    #[serde(default)]
    pub priority: i32,
}

/// Input for creating a story directly in the backlog
///
/// No sprint id: backlog stories must have none, and the priority is
/// computed, never supplied. Unknown fields (a sprint id, an explicit
/// priority) are rejected outright.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBacklogStory {
    /// Story title
    pub title: String,

    /// Longer description
    pub description: Option<String>,

    /// Estimate in points
    pub points: Option<i32>,
}

/// Input for updating a story (partial; absent fields are untouched)
///
/// Nullable fields use a presence-aware double `Option`: absent leaves
/// the field alone, an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStory {
    /// Move to a sprint (value) or back to the backlog (null)
    #[serde(default, deserialize_with = "patch::double_option")]
    pub sprint_id: Option<Option<Uuid>>,

    /// New title
    pub title: Option<String>,

    /// New description, or null to clear
    #[serde(default, deserialize_with = "patch::double_option")]
    pub description: Option<Option<String>>,

    /// New estimate, or null to clear
    #[serde(default, deserialize_with = "patch::double_option")]
    pub points: Option<Option<i32>>,

    /// New completion flag
    pub done: Option<bool>,

    /// New ordering key
    pub priority: Option<i32>,
}

/// Computes the priority assigned to the i-th entry (0-indexed) of a
/// reorder sequence of length `len`: the first-listed story gets the
/// highest value.
pub fn reorder_priority(len: usize, index: usize) -> i32 {
    (len - index) as i32
}

impl Story {
    /// Creates a story, optionally assigned to a sprint of the same project
    ///
    /// # Errors
    ///
    /// - [`StoryError::ProjectNotFound`] if the project does not exist
    /// - [`StoryError::SprintNotFound`] if a sprint id is supplied but absent
    /// - [`StoryError::SprintProjectMismatch`] if the sprint belongs to a
    ///   different project
    pub async fn create(pool: &PgPool, data: CreateStory) -> Result<Self, StoryError> {
        let project_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
                .bind(data.project_id)
                .fetch_one(pool)
                .await?;
        if !project_exists {
            return Err(StoryError::ProjectNotFound);
        }

        if let Some(sprint_id) = data.sprint_id {
            let sprint_project: Uuid =
                sqlx::query_scalar("SELECT project_id FROM sprints WHERE id = $1")
                    .bind(sprint_id)
                    .fetch_optional(pool)
                    .await?
                    .ok_or(StoryError::SprintNotFound)?;
            if sprint_project != data.project_id {
                return Err(StoryError::SprintProjectMismatch);
            }
        }

        let story = sqlx::query_as::<_, Story>(
            r#"
            INSERT INTO stories (project_id, sprint_id, title, description, points, priority)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, project_id, sprint_id, title, description, points, done,
                      priority, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.sprint_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.points)
        .bind(data.priority)
        .fetch_one(pool)
        .await?;

        Ok(story)
    }

    /// Creates a story at the top of the project's backlog
    ///
    /// The priority is `max(priority) + 1` over the current backlog, or 1
    /// when the backlog is empty, computed in the insert statement itself.
    ///
    /// # Errors
    ///
    /// - [`StoryError::ProjectNotFound`] if the project does not exist
    pub async fn create_in_backlog(
        pool: &PgPool,
        project_id: Uuid,
        data: CreateBacklogStory,
    ) -> Result<Self, StoryError> {
        let project_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
                .bind(project_id)
                .fetch_one(pool)
                .await?;
        if !project_exists {
            return Err(StoryError::ProjectNotFound);
        }

        let story = sqlx::query_as::<_, Story>(
            r#"
            INSERT INTO stories (project_id, sprint_id, title, description, points, priority)
            VALUES (
                $1, NULL, $2, $3, $4,
                (SELECT COALESCE(MAX(priority), 0) + 1
                 FROM stories WHERE project_id = $1 AND sprint_id IS NULL)
            )
            RETURNING id, project_id, sprint_id, title, description, points, done,
                      priority, created_at
            "#,
        )
        .bind(project_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.points)
        .fetch_one(pool)
        .await?;

        Ok(story)
    }

    /// Rewrites backlog priorities for exactly the given id sequence
    ///
    /// The i-th id gets priority `N - i`, so `ListStories` returns the
    /// stories in the order they were named. Atomic: if any id does not
    /// resolve to a backlog story, an id appears twice, or any resolved
    /// story belongs to a project other than `project_id`, nothing is
    /// written. Backlog stories not named keep their old priority;
    /// callers reordering the whole backlog must pass the whole backlog.
    ///
    /// Returns the named stories in their new order.
    ///
    /// # Errors
    ///
    /// - [`StoryError::UnknownOrDuplicateIds`] if the resolved count
    ///   differs from the input count
    /// - [`StoryError::CrossProjectReorder`] if a resolved story belongs
    ///   to another project
    pub async fn reorder_backlog(
        pool: &PgPool,
        project_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Self>, StoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = pool.begin().await?;

        let resolved: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT id, project_id
            FROM stories
            WHERE id = ANY($1) AND sprint_id IS NULL
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *tx)
        .await?;

        // ANY() collapses duplicate input ids, so a duplicate shows up as
        // a count mismatch exactly like an unknown id does.
        if resolved.len() != ids.len() {
            return Err(StoryError::UnknownOrDuplicateIds);
        }

        if resolved.iter().any(|(_, p)| *p != project_id) {
            return Err(StoryError::CrossProjectReorder);
        }

        for (index, id) in ids.iter().enumerate() {
            sqlx::query("UPDATE stories SET priority = $2 WHERE id = $1")
                .bind(id)
                .bind(reorder_priority(ids.len(), index))
                .execute(&mut *tx)
                .await?;
        }

        let stories = sqlx::query_as::<_, Story>(
            r#"
            SELECT id, project_id, sprint_id, title, description, points, done,
                   priority, created_at
            FROM stories
            WHERE id = ANY($1)
            ORDER BY priority DESC, created_at ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(stories)
    }

    /// Moves a story into a sprint of its own project
    ///
    /// The story's backlog priority is left as-is; remaining backlog
    /// stories are not renumbered.
    ///
    /// # Errors
    ///
    /// - [`StoryError::StoryNotFound`] / [`StoryError::SprintNotFound`]
    /// - [`StoryError::SprintProjectMismatch`] if the sprint belongs to a
    ///   different project
    pub async fn assign_to_sprint(
        pool: &PgPool,
        story_id: Uuid,
        sprint_id: Uuid,
    ) -> Result<Self, StoryError> {
        let story_project: Uuid =
            sqlx::query_scalar("SELECT project_id FROM stories WHERE id = $1")
                .bind(story_id)
                .fetch_optional(pool)
                .await?
                .ok_or(StoryError::StoryNotFound)?;

        let sprint_project: Uuid =
            sqlx::query_scalar("SELECT project_id FROM sprints WHERE id = $1")
                .bind(sprint_id)
                .fetch_optional(pool)
                .await?
                .ok_or(StoryError::SprintNotFound)?;

        if sprint_project != story_project {
            return Err(StoryError::SprintProjectMismatch);
        }

        let story = sqlx::query_as::<_, Story>(
            r#"
            UPDATE stories
            SET sprint_id = $2
            WHERE id = $1
            RETURNING id, project_id, sprint_id, title, description, points, done,
                      priority, created_at
            "#,
        )
        .bind(story_id)
        .bind(sprint_id)
        .fetch_one(pool)
        .await?;

        Ok(story)
    }

    /// Moves a story out of its sprint, back into the backlog
    ///
    /// The story re-enters the backlog at the top with a fresh
    /// `max(priority) + 1`, mirroring [`Story::create_in_backlog`]. A
    /// story that is already in the backlog is returned unchanged.
    ///
    /// # Errors
    ///
    /// - [`StoryError::StoryNotFound`] if the story does not exist
    pub async fn unassign_from_sprint(pool: &PgPool, story_id: Uuid) -> Result<Self, StoryError> {
        let mut tx = pool.begin().await?;

        let story = sqlx::query_as::<_, Story>(
            r#"
            SELECT id, project_id, sprint_id, title, description, points, done,
                   priority, created_at
            FROM stories
            WHERE id = $1
            "#,
        )
        .bind(story_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoryError::StoryNotFound)?;

        if story.sprint_id.is_none() {
            return Ok(story);
        }

        let story = sqlx::query_as::<_, Story>(
            r#"
            UPDATE stories
            SET sprint_id = NULL,
                priority = (SELECT COALESCE(MAX(priority), 0) + 1
                            FROM stories
                            WHERE project_id = $2 AND sprint_id IS NULL)
            WHERE id = $1
            RETURNING id, project_id, sprint_id, title, description, points, done,
                      priority, created_at
            "#,
        )
        .bind(story_id)
        .bind(story.project_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(story)
    }

    /// Atomically flips the done flag
    ///
    /// One UPDATE statement, so each call flips exactly once; two calls
    /// in sequence restore the original value.
    pub async fn toggle_done(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let story = sqlx::query_as::<_, Story>(
            r#"
            UPDATE stories
            SET done = NOT done
            WHERE id = $1
            RETURNING id, project_id, sprint_id, title, description, points, done,
                      priority, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(story)
    }

    /// Applies a partial update to a story
    ///
    /// Only fields present in the patch are changed. Moving the story to
    /// a sprint this way validates that the sprint belongs to the story's
    /// project.
    ///
    /// # Errors
    ///
    /// - [`StoryError::StoryNotFound`] if the story does not exist
    /// - [`StoryError::SprintNotFound`] / [`StoryError::SprintProjectMismatch`]
    ///   for an invalid sprint move
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateStory) -> Result<Self, StoryError> {
        let mut tx = pool.begin().await?;

        let mut story = sqlx::query_as::<_, Story>(
            r#"
            SELECT id, project_id, sprint_id, title, description, points, done,
                   priority, created_at
            FROM stories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoryError::StoryNotFound)?;

        if let Some(sprint_patch) = data.sprint_id {
            if let Some(sprint_id) = sprint_patch {
                let sprint_project: Uuid =
                    sqlx::query_scalar("SELECT project_id FROM sprints WHERE id = $1")
                        .bind(sprint_id)
                        .fetch_optional(&mut *tx)
                        .await?
                        .ok_or(StoryError::SprintNotFound)?;
                if sprint_project != story.project_id {
                    return Err(StoryError::SprintProjectMismatch);
                }
            }
            story.sprint_id = sprint_patch;
        }
        if let Some(title) = data.title {
            story.title = title;
        }
        if let Some(description) = data.description {
            story.description = description;
        }
        if let Some(points) = data.points {
            story.points = points;
        }
        if let Some(done) = data.done {
            story.done = done;
        }
        if let Some(priority) = data.priority {
            story.priority = priority;
        }

        let story = sqlx::query_as::<_, Story>(
            r#"
            UPDATE stories
            SET sprint_id = $2,
                title = $3,
                description = $4,
                points = $5,
                done = $6,
                priority = $7
            WHERE id = $1
            RETURNING id, project_id, sprint_id, title, description, points, done,
                      priority, created_at
            "#,
        )
        .bind(story.id)
        .bind(story.sprint_id)
        .bind(story.title)
        .bind(story.description)
        .bind(story.points)
        .bind(story.done)
        .bind(story.priority)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(story)
    }

    /// Finds a story by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let story = sqlx::query_as::<_, Story>(
            r#"
            SELECT id, project_id, sprint_id, title, description, points, done,
                   priority, created_at
            FROM stories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(story)
    }

    /// Lists a project's stories, optionally filtered to one sprint
    ///
    /// Ordered by priority descending, then creation time.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
        sprint_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let stories = sqlx::query_as::<_, Story>(
            r#"
            SELECT id, project_id, sprint_id, title, description, points, done,
                   priority, created_at
            FROM stories
            WHERE project_id = $1 AND ($2::uuid IS NULL OR sprint_id = $2)
            ORDER BY priority DESC, created_at ASC
            "#,
        )
        .bind(project_id)
        .bind(sprint_id)
        .fetch_all(pool)
        .await?;

        Ok(stories)
    }

    /// Lists a project's backlog (stories with no sprint), highest
    /// priority first
    pub async fn list_backlog(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let stories = sqlx::query_as::<_, Story>(
            r#"
            SELECT id, project_id, sprint_id, title, description, points, done,
                   priority, created_at
            FROM stories
            WHERE project_id = $1 AND sprint_id IS NULL
            ORDER BY priority DESC, created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(stories)
    }

    /// Deletes a story
    ///
    /// Tasks cascade via the foreign key.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reorder_priority_descends_from_len() {
        // [a, b, c] => a:3, b:2, c:1
        assert_eq!(reorder_priority(3, 0), 3);
        assert_eq!(reorder_priority(3, 1), 2);
        assert_eq!(reorder_priority(3, 2), 1);
    }

    #[test]
    fn test_reorder_priority_single_story() {
        assert_eq!(reorder_priority(1, 0), 1);
    }

    #[test]
    fn test_update_story_null_clears_points() {
        let data: UpdateStory = serde_json::from_str(r#"{"points": null}"#).unwrap();
        assert_eq!(data.points, Some(None));
        assert!(data.title.is_none());
    }

    #[test]
    fn test_update_story_absent_sprint_is_untouched() {
        let data: UpdateStory = serde_json::from_str(r#"{"title": "renamed"}"#).unwrap();
        assert!(data.sprint_id.is_none());
        assert_eq!(data.title.as_deref(), Some("renamed"));
    }

    #[test]
    fn test_update_story_null_sprint_moves_to_backlog() {
        let data: UpdateStory = serde_json::from_str(r#"{"sprint_id": null}"#).unwrap();
        assert_eq!(data.sprint_id, Some(None));
    }

    #[test]
    fn test_create_story_priority_defaults_to_zero() {
        let json = r#"{"project_id": "c1f0f4d8-8b0a-4a8e-9d5f-0f3b6a4c2e1a", "title": "t"}"#;
        let data: CreateStory = serde_json::from_str(json).unwrap();
        assert_eq!(data.priority, 0);
        assert!(data.sprint_id.is_none());
    }
}
