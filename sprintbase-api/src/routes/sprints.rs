/// Sprint lifecycle endpoints
///
/// All operations are membership-gated, including listing: without a
/// project filter the caller only sees sprints of their own projects.
///
/// # Endpoints
///
/// - `POST   /v1/sprints` - Create sprint (auto-numbered)
/// - `GET    /v1/sprints[?project_id=..]` - List sprints
/// - `GET    /v1/sprints/:id` - Get sprint
/// - `PATCH  /v1/sprints/:id` - Partial update
/// - `DELETE /v1/sprints/:id` - Delete sprint

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use sprintbase_shared::{
    auth::{authorization::require_project_member, middleware::AuthContext},
    models::sprint::{CreateSprint, Sprint, UpdateSprint},
};
use uuid::Uuid;

/// Query parameters for sprint listing
#[derive(Debug, Deserialize)]
pub struct ListSprintsQuery {
    /// Restrict to one project
    pub project_id: Option<Uuid>,
}

/// Creates a sprint in a project (members only)
///
/// The sprint number is sequential per project and never reused; the
/// end date is `start_date` plus the project's cadence. Creating an
/// active sprint deactivates every sibling in the same transaction.
pub async fn create_sprint(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateSprint>,
) -> ApiResult<Json<Sprint>> {
    require_project_member(&state.db, req.project_id, auth.user_id).await?;

    let sprint = Sprint::create(&state.db, req).await?;
    Ok(Json(sprint))
}

/// Lists sprints, membership-gated
pub async fn list_sprints(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListSprintsQuery>,
) -> ApiResult<Json<Vec<Sprint>>> {
    let sprints = match query.project_id {
        Some(project_id) => {
            require_project_member(&state.db, project_id, auth.user_id).await?;
            Sprint::list_by_project(&state.db, project_id).await?
        }
        None => Sprint::list_for_user(&state.db, auth.user_id).await?,
    };

    Ok(Json(sprints))
}

/// Gets a sprint (members of its project only)
pub async fn get_sprint(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Sprint>> {
    let sprint = Sprint::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Sprint not found".to_string()))?;

    require_project_member(&state.db, sprint.project_id, auth.user_id).await?;

    Ok(Json(sprint))
}

/// Applies a partial update to a sprint (members only)
///
/// Activating a sprint deactivates its siblings; a sprint whose number
/// is no longer the project maximum is forced inactive.
pub async fn update_sprint(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSprint>,
) -> ApiResult<Json<Sprint>> {
    let sprint = Sprint::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Sprint not found".to_string()))?;

    require_project_member(&state.db, sprint.project_id, auth.user_id).await?;

    let sprint = Sprint::update(&state.db, id, req).await?;
    Ok(Json(sprint))
}

/// Deletes a sprint (members only)
///
/// Its stories return to the backlog.
pub async fn delete_sprint(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let sprint = Sprint::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Sprint not found".to_string()))?;

    require_project_member(&state.db, sprint.project_id, auth.user_id).await?;

    Sprint::delete(&state.db, id).await?;

    Ok(Json(serde_json::json!({ "status": "ok" })))
}
