/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which automatically converts
/// to the appropriate status code with a JSON body.
///
/// # Taxonomy
///
/// - `NotFound` (404): absent resource, or an existing resource the
///   caller is not a member of — the two are deliberately
///   indistinguishable so project existence does not leak
/// - `BadRequest` (400): malformed input, cross-project linkage, bad
///   reorder lists
/// - `InvalidRange` (400): end date precedes start date
/// - `Unauthorized` (401): missing/invalid/expired credential
/// - `Conflict` (400): duplicate email, duplicate project join
/// - `InternalError` (500): storage faults; details are logged, not leaked

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sprintbase_shared::auth::{
    authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError,
};
use sprintbase_shared::models::{sprint::SprintError, story::StoryError};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Date range violation (400)
    InvalidRange(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Not found (404) - also covers membership denial
    NotFound(String),

    /// Conflict - duplicate email or duplicate join (returned as 400)
    Conflict(String),

    /// Request body validation errors (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::InvalidRange(msg) => write!(f, "Invalid range: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::InvalidRange(msg) => (StatusCode::BAD_REQUEST, "invalid_range", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            // Conflicts surface as 400, matching the rest of the
            // invalid-input family.
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already registered".to_string());
                    }
                    if constraint.contains("project_members") {
                        return ApiError::Conflict(
                            "Already a member of this project".to_string(),
                        );
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert sprint lifecycle errors to API errors
impl From<SprintError> for ApiError {
    fn from(err: SprintError) -> Self {
        match err {
            SprintError::ProjectNotFound => ApiError::NotFound("Project not found".to_string()),
            SprintError::SprintNotFound => ApiError::NotFound("Sprint not found".to_string()),
            SprintError::InvalidDateRange => {
                ApiError::InvalidRange("end_date must be >= start_date".to_string())
            }
            SprintError::Database(err) => err.into(),
        }
    }
}

/// Convert story/backlog errors to API errors
impl From<StoryError> for ApiError {
    fn from(err: StoryError) -> Self {
        match err {
            StoryError::ProjectNotFound => ApiError::NotFound("Project not found".to_string()),
            StoryError::SprintNotFound => ApiError::NotFound("Sprint not found".to_string()),
            StoryError::StoryNotFound => ApiError::NotFound("Story not found".to_string()),
            StoryError::SprintProjectMismatch => {
                ApiError::BadRequest("Sprint does not belong to the story's project".to_string())
            }
            StoryError::UnknownOrDuplicateIds => ApiError::BadRequest(
                "Reorder list contains unknown or duplicate story ids".to_string(),
            ),
            StoryError::CrossProjectReorder => {
                ApiError::BadRequest("Reorder list spans multiple projects".to_string())
            }
            StoryError::Database(err) => err.into(),
        }
    }
}

/// Convert membership denial to API errors
///
/// Non-membership is reported as 404, never 403.
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) => ApiError::NotFound("Project not found".to_string()),
            AuthzError::Database(err) => err.into(),
        }
    }
}

/// Convert credential extraction errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Missing credentials".to_string())
            }
            AuthError::InvalidFormat(msg) => ApiError::BadRequest(msg),
        }
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert request body validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        let errors: Vec<ValidationErrorDetail> = e
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Story not found".to_string());
        assert_eq!(err.to_string(), "Not found: Story not found");
    }

    #[test]
    fn test_conflict_maps_to_400() {
        let response = ApiError::Conflict("Email already registered".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_range_maps_to_400() {
        let response =
            ApiError::InvalidRange("end_date must be >= start_date".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_membership_denial_maps_to_not_found() {
        let err: ApiError = AuthzError::NotMember(uuid::Uuid::new_v4()).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_auth_error_mapping() {
        let err: ApiError = AuthError::MissingCredentials.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let err: ApiError = AuthError::InvalidFormat("Expected Bearer token".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_sprint_error_mapping() {
        let err: ApiError = SprintError::InvalidDateRange.into();
        assert!(matches!(err, ApiError::InvalidRange(_)));

        let err: ApiError = SprintError::ProjectNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_story_error_mapping() {
        let err: ApiError = StoryError::UnknownOrDuplicateIds.into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = StoryError::SprintProjectMismatch.into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
