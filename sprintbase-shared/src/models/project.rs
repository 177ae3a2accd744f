/// Project model and database operations
///
/// A project owns sprints and stories and carries the sprint cadence
/// (`sprint_duration`, in days) used to derive sprint end dates.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(200) NOT NULL,
///     sprint_duration INTEGER NOT NULL DEFAULT 14,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use sprintbase_shared::models::project::{Project, CreateProject};
/// use sprintbase_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let creator = Uuid::new_v4();
///
/// // The creator is enrolled as a member in the same transaction.
/// let project = Project::create_with_owner(&pool, CreateProject {
///     name: "Website relaunch".to_string(),
///     sprint_duration: 14,
/// }, creator).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Project model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Sprint cadence in days; new sprints end `start + sprint_duration`
    pub sprint_duration: i32,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    /// Project name
    pub name: String,

    /// Sprint cadence in days
    pub sprint_duration: i32,
}

/// Input for updating a project (partial; absent fields are untouched)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    /// New project name
    pub name: Option<String>,

    /// New sprint cadence in days
    pub sprint_duration: Option<i32>,
}

impl Project {
    /// Creates a project and enrolls the creator as a member
    ///
    /// Both inserts run in a single transaction so a crash between the two
    /// can never leave a project without an owner.
    ///
    /// # Errors
    ///
    /// Returns an error if either insert fails; nothing is committed in
    /// that case.
    pub async fn create_with_owner(
        pool: &PgPool,
        data: CreateProject,
        owner_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, sprint_duration)
            VALUES ($1, $2)
            RETURNING id, name, sprint_duration, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.sprint_duration)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, 'owner')
            "#,
        )
        .bind(project.id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, sprint_duration, created_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Applies a partial update; absent fields keep their prior values
    ///
    /// Returns the updated project, or None if the project does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                sprint_duration = COALESCE($3, sprint_duration)
            WHERE id = $1
            RETURNING id, name, sprint_duration, created_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.sprint_duration)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Deletes a project
    ///
    /// Sprints, stories, and memberships cascade via foreign keys.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
