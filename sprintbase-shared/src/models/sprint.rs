/// Sprint model and lifecycle operations
///
/// Sprints are auto-numbered per project and at most one sprint per
/// project may be active at any time.
///
/// # Lifecycle rules
///
/// - `sprint_number` is `count(sprints of project) + 1` at creation time.
///   The counter is count-based, not max-based: deleting a sprint lowers
///   the count, so the next number tracks how many sprints exist, not the
///   highest number ever issued.
/// - `end_date` is derived from the project cadence at creation
///   (`start_date + sprint_duration` days) and never recomputed on
///   update; callers updating dates must supply a consistent pair.
/// - Activating a sprint deactivates every sibling in the same
///   transaction.
/// - After any update, a sprint whose number is no longer the project
///   maximum is forced inactive: the active sprint must be the
///   latest-numbered one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sprints (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     sprint_number INTEGER NOT NULL,
///     sprint_name VARCHAR(200) NOT NULL,
///     start_date DATE NOT NULL,
///     end_date DATE NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use sprintbase_shared::models::sprint::{Sprint, CreateSprint};
/// use sprintbase_shared::db::pool::{create_pool, DatabaseConfig};
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let sprint = Sprint::create(&pool, CreateSprint {
///     project_id: Uuid::new_v4(),
///     start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     is_active: true,
/// }).await?;
///
/// assert_eq!(sprint.sprint_number, 1);
/// assert_eq!(sprint.sprint_name, "Sprint 1");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Error type for sprint lifecycle operations
#[derive(Debug, thiserror::Error)]
pub enum SprintError {
    /// Referenced project does not exist
    #[error("Project not found")]
    ProjectNotFound,

    /// Referenced sprint does not exist
    #[error("Sprint not found")]
    SprintNotFound,

    /// End date precedes start date
    #[error("end_date must be >= start_date")]
    InvalidDateRange,

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Sprint model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sprint {
    /// Unique sprint ID
    pub id: Uuid,

    /// Project this sprint belongs to
    pub project_id: Uuid,

    /// Sequential 1-based number within the project
    pub sprint_number: i32,

    /// Display name ("Sprint {number}" at creation)
    pub sprint_name: String,

    /// First day of the sprint
    pub start_date: NaiveDate,

    /// Last day of the sprint (start + project cadence at creation)
    pub end_date: NaiveDate,

    /// Whether this is the project's active sprint
    pub is_active: bool,

    /// When the sprint was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new sprint
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSprint {
    /// Project to create the sprint in
    pub project_id: Uuid,

    /// First day of the sprint
    pub start_date: NaiveDate,

    /// Whether the new sprint becomes the active one
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Input for updating a sprint (partial; absent fields are untouched)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSprint {
    /// New sprint number
    pub sprint_number: Option<i32>,

    /// New display name
    pub sprint_name: Option<String>,

    /// New start date
    pub start_date: Option<NaiveDate>,

    /// New end date
    pub end_date: Option<NaiveDate>,

    /// New active flag
    pub is_active: Option<bool>,
}

/// Derives a sprint's end date from its start date and the project
/// cadence in days.
pub fn end_date_for(start_date: NaiveDate, sprint_duration: i32) -> NaiveDate {
    start_date + Duration::days(i64::from(sprint_duration))
}

impl Sprint {
    /// Creates a new sprint with the next sequential number
    ///
    /// Runs in a single transaction: sibling deactivation (when the new
    /// sprint is active), the count-based number assignment, and the
    /// insert all commit or roll back together.
    ///
    /// # Errors
    ///
    /// - [`SprintError::ProjectNotFound`] if the project does not exist
    /// - [`SprintError::InvalidDateRange`] if the derived end date
    ///   precedes the start date (misconfigured negative cadence)
    pub async fn create(pool: &PgPool, data: CreateSprint) -> Result<Self, SprintError> {
        let mut tx = pool.begin().await?;

        let sprint_duration: i32 =
            sqlx::query_scalar("SELECT sprint_duration FROM projects WHERE id = $1")
                .bind(data.project_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(SprintError::ProjectNotFound)?;

        let end_date = end_date_for(data.start_date, sprint_duration);
        if end_date < data.start_date {
            return Err(SprintError::InvalidDateRange);
        }

        if data.is_active {
            sqlx::query(
                "UPDATE sprints SET is_active = FALSE WHERE project_id = $1 AND is_active",
            )
            .bind(data.project_id)
            .execute(&mut *tx)
            .await?;
        }

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sprints WHERE project_id = $1")
            .bind(data.project_id)
            .fetch_one(&mut *tx)
            .await?;
        let number = existing as i32 + 1;

        let sprint = sqlx::query_as::<_, Sprint>(
            r#"
            INSERT INTO sprints (project_id, sprint_number, sprint_name, start_date, end_date, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, project_id, sprint_number, sprint_name, start_date, end_date,
                      is_active, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(number)
        .bind(format!("Sprint {}", number))
        .bind(data.start_date)
        .bind(end_date)
        .bind(data.is_active)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(sprint)
    }

    /// Applies a partial update to a sprint
    ///
    /// Only provided fields are changed. Setting `is_active` to true
    /// deactivates every other sprint of the project first. After the
    /// fields are applied, the latest-number guard runs unconditionally:
    /// if the sprint's number is no longer the project maximum, it is
    /// forced inactive. The end date is never recomputed from the
    /// cadence here.
    ///
    /// # Errors
    ///
    /// - [`SprintError::SprintNotFound`] if the sprint does not exist
    /// - [`SprintError::InvalidDateRange`] if the resulting dates are
    ///   inverted
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateSprint) -> Result<Self, SprintError> {
        let mut tx = pool.begin().await?;

        let mut sprint = sqlx::query_as::<_, Sprint>(
            r#"
            SELECT id, project_id, sprint_number, sprint_name, start_date, end_date,
                   is_active, created_at
            FROM sprints
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(SprintError::SprintNotFound)?;

        if let Some(number) = data.sprint_number {
            sprint.sprint_number = number;
        }
        if let Some(name) = data.sprint_name {
            sprint.sprint_name = name;
        }
        if let Some(start) = data.start_date {
            sprint.start_date = start;
        }
        if let Some(end) = data.end_date {
            sprint.end_date = end;
        }
        if let Some(active) = data.is_active {
            if active {
                sqlx::query(
                    r#"
                    UPDATE sprints
                    SET is_active = FALSE
                    WHERE project_id = $1 AND id != $2 AND is_active
                    "#,
                )
                .bind(sprint.project_id)
                .bind(sprint.id)
                .execute(&mut *tx)
                .await?;
            }
            sprint.is_active = active;
        }

        // Latest-number guard, evaluated on every update: an active sprint
        // must carry the highest number in its project.
        let max_other: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(sprint_number) FROM sprints WHERE project_id = $1 AND id != $2",
        )
        .bind(sprint.project_id)
        .bind(sprint.id)
        .fetch_one(&mut *tx)
        .await?;

        let max_number = max_other
            .map(|m| m.max(sprint.sprint_number))
            .unwrap_or(sprint.sprint_number);
        if sprint.sprint_number != max_number {
            sprint.is_active = false;
        }

        if sprint.end_date < sprint.start_date {
            return Err(SprintError::InvalidDateRange);
        }

        let sprint = sqlx::query_as::<_, Sprint>(
            r#"
            UPDATE sprints
            SET sprint_number = $2,
                sprint_name = $3,
                start_date = $4,
                end_date = $5,
                is_active = $6
            WHERE id = $1
            RETURNING id, project_id, sprint_number, sprint_name, start_date, end_date,
                      is_active, created_at
            "#,
        )
        .bind(sprint.id)
        .bind(sprint.sprint_number)
        .bind(sprint.sprint_name)
        .bind(sprint.start_date)
        .bind(sprint.end_date)
        .bind(sprint.is_active)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(sprint)
    }

    /// Finds a sprint by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sprint = sqlx::query_as::<_, Sprint>(
            r#"
            SELECT id, project_id, sprint_number, sprint_name, start_date, end_date,
                   is_active, created_at
            FROM sprints
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(sprint)
    }

    /// Lists the sprints of a project, oldest number first
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let sprints = sqlx::query_as::<_, Sprint>(
            r#"
            SELECT id, project_id, sprint_number, sprint_name, start_date, end_date,
                   is_active, created_at
            FROM sprints
            WHERE project_id = $1
            ORDER BY sprint_number ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(sprints)
    }

    /// Lists sprints across every project the user is a member of
    ///
    /// Sprint listing is membership-gated: without a project filter, the
    /// caller only sees sprints of their own projects.
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let sprints = sqlx::query_as::<_, Sprint>(
            r#"
            SELECT s.id, s.project_id, s.sprint_number, s.sprint_name, s.start_date,
                   s.end_date, s.is_active, s.created_at
            FROM sprints s
            JOIN project_members m ON m.project_id = s.project_id
            WHERE m.user_id = $1
            ORDER BY s.project_id, s.sprint_number ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(sprints)
    }

    /// Deletes a sprint
    ///
    /// Stories referencing it return to the backlog via the
    /// `ON DELETE SET NULL` foreign key.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sprints WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_end_date_for_week_cadence() {
        assert_eq!(
            end_date_for(date(2024, 1, 1), 7),
            date(2024, 1, 8),
        );
    }

    #[test]
    fn test_end_date_for_zero_cadence() {
        assert_eq!(end_date_for(date(2024, 1, 1), 0), date(2024, 1, 1));
    }

    #[test]
    fn test_end_date_for_negative_cadence_inverts_range() {
        let start = date(2024, 1, 1);
        let end = end_date_for(start, -3);
        assert!(end < start);
    }

    #[test]
    fn test_end_date_crosses_month_boundary() {
        assert_eq!(end_date_for(date(2024, 1, 29), 14), date(2024, 2, 12));
    }

    #[test]
    fn test_create_sprint_defaults_to_active() {
        let json = r#"{"project_id": "c1f0f4d8-8b0a-4a8e-9d5f-0f3b6a4c2e1a", "start_date": "2024-01-01"}"#;
        let data: CreateSprint = serde_json::from_str(json).unwrap();
        assert!(data.is_active);
    }

    #[test]
    fn test_update_sprint_absent_fields_are_none() {
        let data: UpdateSprint = serde_json::from_str(r#"{"is_active": true}"#).unwrap();
        assert_eq!(data.is_active, Some(true));
        assert!(data.sprint_number.is_none());
        assert!(data.start_date.is_none());
    }
}
