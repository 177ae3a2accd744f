/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Test user creation
/// - JWT token generation
/// - Request helpers

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sprintbase_api::app::{build_router, AppState};
use sprintbase_api::config::Config;
use sprintbase_shared::auth::jwt::{create_token, Claims};
use sprintbase_shared::models::user::{CreateUser, User};
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub jwt_token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh user
    pub async fn new() -> anyhow::Result<Self> {
        // Load test configuration
        let config = Config::from_env()?;

        // Connect to database
        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../sprintbase-shared/migrations")
            .run(&db)
            .await?;

        // Create test user
        let user = User::create(
            &db,
            CreateUser {
                name: "Test User".to_string(),
                email: format!("test-{}@example.com", Uuid::new_v4()),
                password_hash: "test_hash".to_string(), // Not used in tests
                role: None,
            },
        )
        .await?;

        // Generate JWT token
        let claims = Claims::new(user.id, config.jwt.access_token_expire_minutes);
        let jwt_token = create_token(&claims, &config.jwt.secret)?;

        // Build app
        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            user,
            jwt_token,
        })
    }

    /// Registers a second user in the same database, for access tests
    pub async fn second_user(&self) -> anyhow::Result<(User, String)> {
        let user = User::create(
            &self.db,
            CreateUser {
                name: "Other User".to_string(),
                email: format!("other-{}@example.com", Uuid::new_v4()),
                password_hash: "test_hash".to_string(),
                role: None,
            },
        )
        .await?;

        let claims = Claims::new(user.id, self.config.jwt.access_token_expire_minutes);
        let token = create_token(&claims, &self.config.jwt.secret)?;

        Ok((user, token))
    }

    /// Returns authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Sends a request with the context's token and parses the JSON body
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        self.request_as(method, uri, &self.jwt_token, body).await
    }

    /// Sends a request with an explicit token
    pub async fn request_as(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", token));

        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let request = builder.body(body).unwrap();
        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, json)
    }

    /// Cleans up test data
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        // Deleting the user cascades to memberships; projects created in a
        // test are deleted explicitly by that test.
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(self.user.id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Helper to create a test project via the API, returning its id
pub async fn create_test_project(ctx: &TestContext, name: &str) -> Uuid {
    let (status, body) = ctx
        .request(
            "POST",
            "/v1/projects",
            Some(serde_json::json!({ "name": name, "sprint_duration": 14 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "project creation failed: {}", body);

    body["id"].as_str().unwrap().parse().unwrap()
}

/// Helper to create a backlog story, returning its id
pub async fn create_backlog_story(ctx: &TestContext, project_id: Uuid, title: &str) -> Uuid {
    let (status, body) = ctx
        .request(
            "POST",
            &format!("/v1/projects/{}/backlog", project_id),
            Some(serde_json::json!({ "title": title })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "story creation failed: {}", body);

    body["id"].as_str().unwrap().parse().unwrap()
}

/// Helper to delete a project (and everything under it) via the API
pub async fn delete_test_project(ctx: &TestContext, project_id: Uuid) {
    let (status, _) = ctx
        .request("DELETE", &format!("/v1/projects/{}", project_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}
