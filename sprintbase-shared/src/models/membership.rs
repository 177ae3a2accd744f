/// Project membership model and database operations
///
/// Membership is the relation granting a user visibility and mutation
/// rights over a project's sprints, stories, and tasks. It is the single
/// source of truth for authorization; there is no denormalized per-user
/// projection alongside it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role VARCHAR(50) NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
///
/// The composite primary key enforces that a user may not join the same
/// project twice.
///
/// # Example
///
/// ```no_run
/// use sprintbase_shared::models::membership::{Membership, CreateMembership};
/// use sprintbase_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let (project_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());
///
/// let membership = Membership::create(&pool, CreateMembership {
///     project_id,
///     user_id,
///     role: "developer".to_string(),
/// }).await?;
///
/// assert!(Membership::has_access(&pool, project_id, user_id).await?);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Membership model representing a user-project relationship
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role label within the project (e.g. "owner", "developer")
    pub role: String,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMembership {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role label to record
    pub role: String,
}

/// A project together with the caller's role in it
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProjectWithRole {
    /// Project ID
    pub project_id: Uuid,

    /// Project name
    pub name: String,

    /// The user's role label in this project
    pub role: String,
}

impl Membership {
    /// Creates a new membership (user joins a project)
    ///
    /// # Errors
    ///
    /// Returns an error if the user is already a member (primary key
    /// violation), the project or user does not exist (foreign key
    /// violation), or the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateMembership) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING project_id, user_id, role, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Checks whether a user is a member of a project
    pub async fn has_access(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM project_members
                WHERE project_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Lists a user's projects with their role labels
    pub async fn list_projects_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ProjectWithRole>, sqlx::Error> {
        let projects = sqlx::query_as::<_, ProjectWithRole>(
            r#"
            SELECT m.project_id, p.name, m.role
            FROM project_members m
            JOIN projects p ON p.id = m.project_id
            WHERE m.user_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }
}
