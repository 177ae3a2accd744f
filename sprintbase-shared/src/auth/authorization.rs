/// Project-membership authorization policy
///
/// Every project-scoped operation (project, sprint, story, and task
/// routes, transitively via the parent story) goes through
/// [`require_project_member`] before reading or mutating anything. It is
/// a pure check against the `project_members` relation.
///
/// Denial is surfaced to HTTP callers as 404 Not Found rather than 403,
/// so non-members cannot distinguish "project exists but is not yours"
/// from "project does not exist".
///
/// # Example
///
/// ```no_run
/// use sprintbase_shared::auth::authorization::require_project_member;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// require_project_member(&pool, project_id, user_id).await?;
/// // caller may act on the project's resources
/// # Ok(())
/// # }
/// ```

use crate::models::membership::Membership;
use sqlx::PgPool;
use uuid::Uuid;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User is not a member of the project (mapped to 404 at the API)
    #[error("User is not a member of project {0}")]
    NotMember(Uuid),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Requires that `user_id` is a member of `project_id`
///
/// # Errors
///
/// - [`AuthzError::NotMember`] when the user has no membership row
/// - [`AuthzError::Database`] on storage failure
pub async fn require_project_member(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<(), AuthzError> {
    if Membership::has_access(pool, project_id, user_id).await? {
        Ok(())
    } else {
        Err(AuthzError::NotMember(project_id))
    }
}
