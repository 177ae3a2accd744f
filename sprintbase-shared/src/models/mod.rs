/// Database models for Sprintbase
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and authentication
/// - `project`: Projects with a sprint cadence
/// - `membership`: User-project membership with role labels
/// - `sprint`: Sprints with auto-numbering and single-active enforcement
/// - `story`: Backlog/sprint stories with dense priority ordering
/// - `task`: Tasks belonging to a story
///
/// # Example
///
/// ```no_run
/// use sprintbase_shared::models::user::{User, CreateUser};
/// use sprintbase_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     name: "Jane Doe".to_string(),
///     email: "jane@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: None,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod membership;
pub mod patch;
pub mod project;
pub mod sprint;
pub mod story;
pub mod task;
pub mod user;
