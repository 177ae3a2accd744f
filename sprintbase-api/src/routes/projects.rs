/// Project endpoints: CRUD, membership join, and backlog operations
///
/// Every project-scoped handler runs the membership guard before
/// touching anything; non-members get 404.
///
/// # Endpoints
///
/// - `POST   /v1/projects` - Create project (creator auto-enrolled)
/// - `GET    /v1/projects` - List the caller's projects with roles
/// - `GET    /v1/projects/:id` - Get project
/// - `PATCH  /v1/projects/:id` - Update project
/// - `DELETE /v1/projects/:id` - Delete project
/// - `POST   /v1/projects/:id/join` - Join project with a role label
/// - `GET    /v1/projects/:id/backlog` - List the backlog
/// - `POST   /v1/projects/:id/backlog` - Create a story at the top of
///   the backlog
/// - `POST   /v1/projects/:id/backlog/reorder` - Rewrite backlog order

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use sprintbase_shared::{
    auth::{authorization::require_project_member, middleware::AuthContext},
    models::{
        membership::{CreateMembership, Membership, ProjectWithRole},
        project::{CreateProject, Project, UpdateProject},
        story::{CreateBacklogStory, Story},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project name
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    /// Sprint cadence in days
    pub sprint_duration: i32,
}

/// Join project request
#[derive(Debug, Deserialize, Validate)]
pub struct JoinProjectRequest {
    /// Role label to record for the membership
    #[validate(length(min = 1, max = 50, message = "Role must be 1-50 characters"))]
    pub role: Option<String>,
}

/// Create backlog story request
///
/// No sprint or priority field: backlog creation computes the priority
/// and never assigns a sprint, and unknown fields are rejected so a
/// smuggled `sprint_id` fails instead of being silently dropped.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateBacklogStoryRequest {
    /// Story title
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    /// Longer description
    pub description: Option<String>,

    /// Estimate in points
    #[validate(range(min = 0, message = "Points must be >= 0"))]
    pub points: Option<i32>,
}

/// Reorder backlog request
#[derive(Debug, Deserialize)]
pub struct ReorderBacklogRequest {
    /// Story ids in the desired display order, first = highest priority
    pub story_ids: Vec<Uuid>,
}

/// Creates a project and enrolls the creator as its first member
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;

    let project = Project::create_with_owner(
        &state.db,
        CreateProject {
            name: req.name,
            sprint_duration: req.sprint_duration,
        },
        auth.user_id,
    )
    .await?;

    Ok(Json(project))
}

/// Lists the caller's projects with their role labels
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProjectWithRole>>> {
    let projects = Membership::list_projects_for_user(&state.db, auth.user_id).await?;
    Ok(Json(projects))
}

/// Gets a project (members only)
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    require_project_member(&state.db, id, auth.user_id).await?;

    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}

/// Applies a partial update to a project (members only)
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProject>,
) -> ApiResult<Json<Project>> {
    require_project_member(&state.db, id, auth.user_id).await?;

    let project = Project::update(&state.db, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}

/// Deletes a project and everything it owns (members only)
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_project_member(&state.db, id, auth.user_id).await?;

    let deleted = Project::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// Joins the caller to a project with a role label
///
/// # Errors
///
/// - `404`: project does not exist
/// - `400`: already a member
pub async fn join_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<JoinProjectRequest>,
) -> ApiResult<Json<Membership>> {
    req.validate()?;

    if Project::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    // Duplicate joins hit the composite primary key and surface as 400.
    let membership = Membership::create(
        &state.db,
        CreateMembership {
            project_id: id,
            user_id: auth.user_id,
            role: req.role.unwrap_or_else(|| "member".to_string()),
        },
    )
    .await?;

    Ok(Json(membership))
}

/// Lists the project's backlog, highest priority first (members only)
pub async fn get_backlog(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Story>>> {
    require_project_member(&state.db, id, auth.user_id).await?;

    let stories = Story::list_backlog(&state.db, id).await?;
    Ok(Json(stories))
}

/// Creates a story at the top of the project's backlog (members only)
///
/// The priority is computed (`max + 1`), never supplied; the request
/// schema has no sprint or priority field and rejects unknown ones.
pub async fn create_backlog_story(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateBacklogStoryRequest>,
) -> ApiResult<Json<Story>> {
    req.validate()?;

    require_project_member(&state.db, id, auth.user_id).await?;

    let story = Story::create_in_backlog(
        &state.db,
        id,
        CreateBacklogStory {
            title: req.title,
            description: req.description,
            points: req.points,
        },
    )
    .await?;

    Ok(Json(story))
}

/// Rewrites the backlog order for the named stories (members only)
///
/// Atomic: unknown ids, duplicates, or stories of another project fail
/// the whole call with 400 and no partial write.
pub async fn reorder_backlog(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReorderBacklogRequest>,
) -> ApiResult<Json<Vec<Story>>> {
    require_project_member(&state.db, id, auth.user_id).await?;

    let stories = Story::reorder_backlog(&state.db, id, &req.story_ids).await?;
    Ok(Json(stories))
}
