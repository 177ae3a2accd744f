/// Story endpoints: CRUD, sprint assignment, and the done toggle
///
/// Access control follows the story's project: every handler resolves
/// the project and runs the membership guard before reading or writing.
///
/// # Endpoints
///
/// - `POST   /v1/stories` - Create story
/// - `GET    /v1/stories?project_id=..[&sprint_id=..]` - List stories
/// - `GET    /v1/stories/:id` - Get story
/// - `PATCH  /v1/stories/:id` - Partial update
/// - `DELETE /v1/stories/:id` - Delete story
/// - `POST   /v1/stories/:id/toggle-done` - Flip the done flag
/// - `POST   /v1/stories/:id/assign-sprint/:sprint_id` - Move into a sprint
/// - `POST   /v1/stories/:id/unassign-sprint` - Return to the backlog

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::require_story_access,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use sprintbase_shared::{
    auth::{authorization::require_project_member, middleware::AuthContext},
    models::story::{CreateStory, Story, UpdateStory},
};
use uuid::Uuid;

/// Query parameters for story listing
#[derive(Debug, Deserialize)]
pub struct ListStoriesQuery {
    /// Project whose stories to list
    pub project_id: Uuid,

    /// Restrict to one sprint
    pub sprint_id: Option<Uuid>,
}

/// Creates a story, optionally already assigned to a sprint (members only)
pub async fn create_story(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateStory>,
) -> ApiResult<Json<Story>> {
    require_project_member(&state.db, req.project_id, auth.user_id).await?;

    let story = Story::create(&state.db, req).await?;
    Ok(Json(story))
}

/// Lists a project's stories, optionally filtered to one sprint
/// (members only)
pub async fn list_stories(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListStoriesQuery>,
) -> ApiResult<Json<Vec<Story>>> {
    require_project_member(&state.db, query.project_id, auth.user_id).await?;

    let stories = Story::list_by_project(&state.db, query.project_id, query.sprint_id).await?;
    Ok(Json(stories))
}

/// Gets a story (members of its project only)
pub async fn get_story(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Story>> {
    let story = require_story_access(&state, id, auth.user_id).await?;
    Ok(Json(story))
}

/// Applies a partial update to a story (members only)
///
/// `sprint_id: null` returns the story to the backlog; a sprint value
/// must belong to the story's project.
pub async fn update_story(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStory>,
) -> ApiResult<Json<Story>> {
    require_story_access(&state, id, auth.user_id).await?;

    let story = Story::update(&state.db, id, req).await?;
    Ok(Json(story))
}

/// Deletes a story and its tasks (members only)
pub async fn delete_story(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_story_access(&state, id, auth.user_id).await?;

    Story::delete(&state.db, id).await?;

    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// Flips the story's done flag (members only)
pub async fn toggle_done(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Story>> {
    require_story_access(&state, id, auth.user_id).await?;

    let story = Story::toggle_done(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Story not found".to_string()))?;

    Ok(Json(story))
}

/// Moves a story into a sprint of its own project (members only)
pub async fn assign_to_sprint(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, sprint_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Story>> {
    require_story_access(&state, id, auth.user_id).await?;

    let story = Story::assign_to_sprint(&state.db, id, sprint_id).await?;
    Ok(Json(story))
}

/// Returns a story from its sprint to the top of the backlog
/// (members only)
pub async fn unassign_from_sprint(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Story>> {
    require_story_access(&state, id, auth.user_id).await?;

    let story = Story::unassign_from_sprint(&state.db, id).await?;
    Ok(Json(story))
}
