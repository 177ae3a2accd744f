/// Task endpoints
///
/// Tasks inherit their access rule from the story they belong to: the
/// handler walks task -> story -> project and runs the membership guard
/// on the project.
///
/// # Endpoints
///
/// - `POST   /v1/tasks` - Create task under a story
/// - `GET    /v1/tasks?story_id=..` - List a story's tasks
/// - `GET    /v1/tasks/:id` - Get task
/// - `PATCH  /v1/tasks/:id` - Partial update
/// - `DELETE /v1/tasks/:id` - Delete task
/// - `POST   /v1/tasks/:id/toggle-done` - Flip the done flag

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
    auth::middleware::AuthContext,
    models::task::{CreateTask, Task, UpdateTask},
};
use uuid::Uuid;

/// Query parameters for task listing
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    /// Story whose tasks to list
    pub story_id: Uuid,
}

/// Resolves a task and checks membership via its story's project
async fn require_task_access(
    state: &AppState,
    task_id: Uuid,
    user_id: Uuid,
) -> Result<Task, ApiError> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    require_story_access(state, task.story_id, user_id).await?;

    Ok(task)
}

/// Creates a task under a story (members of the story's project only)
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTask>,
) -> ApiResult<Json<Task>> {
    require_story_access(&state, req.story_id, auth.user_id).await?;

    let task = Task::create(&state.db, req).await?;
    Ok(Json(task))
}

/// Lists a story's tasks in creation order (members only)
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    require_story_access(&state, query.story_id, auth.user_id).await?;

    let tasks = Task::list_by_story(&state.db, query.story_id).await?;
    Ok(Json(tasks))
}

/// Gets a task (members only)
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = require_task_access(&state, id, auth.user_id).await?;
    Ok(Json(task))
}

/// Applies a partial update to a task (members only)
///
/// `assignee_id: null` unassigns; absent fields are untouched.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTask>,
) -> ApiResult<Json<Task>> {
    require_task_access(&state, id, auth.user_id).await?;

    let task = Task::update(&state.db, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Flips the task's done flag (members only)
pub async fn toggle_done(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    require_task_access(&state, id, auth.user_id).await?;

    let task = Task::toggle_done(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Deletes a task (members only)
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_task_access(&state, id, auth.user_id).await?;

    Task::delete(&state.db, id).await?;

    Ok(Json(serde_json::json!({ "status": "ok" })))
}
