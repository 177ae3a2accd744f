/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, me)
/// - `projects`: Project CRUD, membership join, backlog operations
/// - `sprints`: Sprint lifecycle endpoints
/// - `stories`: Story CRUD and sprint assignment
/// - `tasks`: Task CRUD

pub mod auth;
pub mod health;
pub mod projects;
pub mod sprints;
pub mod stories;
pub mod tasks;

use crate::{app::AppState, error::ApiError};
use sprintbase_shared::{auth::authorization::require_project_member, models::story::Story};
use uuid::Uuid;

/// Resolves a story and checks the caller's membership in its project
///
/// Shared by the story routes and, transitively, the task routes. A
/// missing story and a membership denial both come back as 404, so a
/// caller cannot distinguish "does not exist" from "not yours".
pub(crate) async fn require_story_access(
    state: &AppState,
    story_id: Uuid,
    user_id: Uuid,
) -> Result<Story, ApiError> {
    let story = Story::find_by_id(&state.db, story_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Story not found".to_string()))?;

    require_project_member(&state.db, story.project_id, user_id).await?;

    Ok(story)
}
