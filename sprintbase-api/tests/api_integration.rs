/// Integration tests for the Sprintbase API
///
/// These tests verify the full system works end-to-end:
/// - Registration, login, and token-gated endpoints
/// - Project creation with creator auto-enrollment
/// - Membership denial reported as 404
/// - Sprint numbering and the single-active-sprint rule
/// - Backlog append and reorder semantics
/// - Story sprint moves and the done toggle
///
/// They need `DATABASE_URL` and `JWT_SECRET` pointing at a disposable
/// PostgreSQL database, so they are ignored by default:
///
/// ```bash
/// cargo test -p sprintbase-api -- --ignored
/// ```

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use serde_json::json;
use tower::Service as _;

/// Requests without a bearer token are rejected outright
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_authentication_required() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("GET")
        .uri("/v1/projects")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

/// Register, login, and read back the account via /me
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_register_login_me() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("alice-{}@example.com", uuid::Uuid::new_v4());

    let (status, registered) = ctx
        .request(
            "POST",
            "/v1/auth/register",
            Some(json!({
                "name": "Alice",
                "email": email,
                "password": "correct horse battery"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(registered["email"], email);
    // The password hash never leaves the server
    assert!(registered.get("password_hash").is_none());

    let (status, login) = ctx
        .request(
            "POST",
            "/v1/auth/login",
            Some(json!({ "email": email, "password": "correct horse battery" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["token_type"], "bearer");
    let token = login["access_token"].as_str().unwrap().to_string();

    let (status, me) = ctx.request_as("GET", "/v1/auth/me", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], email);

    // Wrong password gets the same message as an unknown email
    let (status, _) = ctx
        .request(
            "POST",
            "/v1/auth/login",
            Some(json!({ "email": email, "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

/// Duplicate registration of the same email is rejected
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_register_duplicate_email() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("dup-{}@example.com", uuid::Uuid::new_v4());
    let body = json!({ "name": "Dup", "email": email, "password": "long enough pw" });

    let (status, _) = ctx
        .request("POST", "/v1/auth/register", Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, error) = ctx.request("POST", "/v1/auth/register", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "conflict");
    assert_eq!(error["message"], "Email already registered");

    ctx.cleanup().await.unwrap();
}

/// Creating a project enrolls the creator; listing shows the role
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_create_project_enrolls_creator() {
    let ctx = TestContext::new().await.unwrap();

    let project_id = common::create_test_project(&ctx, "Apollo").await;

    let (status, projects) = ctx.request("GET", "/v1/projects", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = projects
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["project_id"] == project_id.to_string())
        .expect("created project missing from listing");
    assert_eq!(listed["role"], "owner");

    common::delete_test_project(&ctx, project_id).await;
    ctx.cleanup().await.unwrap();
}

/// Non-members see 404 for project resources, never 403
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_membership_denial_reads_as_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let (_, outsider_token) = ctx.second_user().await.unwrap();

    let project_id = common::create_test_project(&ctx, "Private").await;

    let (status, body) = ctx
        .request_as(
            "GET",
            &format!("/v1/projects/{}", project_id),
            &outsider_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Project not found");

    // Same for nested resources
    let (status, _) = ctx
        .request_as(
            "GET",
            &format!("/v1/projects/{}/backlog", project_id),
            &outsider_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::delete_test_project(&ctx, project_id).await;
    ctx.cleanup().await.unwrap();
}

/// Joining a project grants access; joining twice is a 400
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_join_project() {
    let ctx = TestContext::new().await.unwrap();
    let (_, joiner_token) = ctx.second_user().await.unwrap();

    let project_id = common::create_test_project(&ctx, "Open").await;
    let join_uri = format!("/v1/projects/{}/join", project_id);

    let (status, membership) = ctx
        .request_as("POST", &join_uri, &joiner_token, Some(json!({ "role": "developer" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(membership["role"], "developer");

    // Access granted
    let (status, _) = ctx
        .request_as(
            "GET",
            &format!("/v1/projects/{}", project_id),
            &joiner_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Second join hits the composite key
    let (status, _) = ctx
        .request_as("POST", &join_uri, &joiner_token, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::delete_test_project(&ctx, project_id).await;
    ctx.cleanup().await.unwrap();
}

/// Sprint numbers are sequential and a new active sprint deactivates
/// the previous one
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_sprint_numbering_and_single_active() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = common::create_test_project(&ctx, "Sprints").await;

    let (status, first) = ctx
        .request(
            "POST",
            "/v1/sprints",
            Some(json!({ "project_id": project_id, "start_date": "2026-01-05" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["sprint_number"], 1);
    assert_eq!(first["sprint_name"], "Sprint 1");
    assert_eq!(first["is_active"], true);
    // 14-day cadence from the project default
    assert_eq!(first["end_date"], "2026-01-19");

    let (status, second) = ctx
        .request(
            "POST",
            "/v1/sprints",
            Some(json!({ "project_id": project_id, "start_date": "2026-01-19" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["sprint_number"], 2);
    assert_eq!(second["is_active"], true);

    // The first sprint was deactivated by the second
    let (_, first_again) = ctx
        .request("GET", &format!("/v1/sprints/{}", first["id"].as_str().unwrap()), None)
        .await;
    assert_eq!(first_again["is_active"], false);

    // Re-activating a non-latest sprint is forced back to inactive
    let (status, reactivated) = ctx
        .request(
            "PATCH",
            &format!("/v1/sprints/{}", first["id"].as_str().unwrap()),
            Some(json!({ "is_active": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reactivated["is_active"], false);

    common::delete_test_project(&ctx, project_id).await;
    ctx.cleanup().await.unwrap();
}

/// Sprint numbering is count-based, tracking how many sprints exist
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_sprint_numbering_count_based() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = common::create_test_project(&ctx, "Numbering").await;

    let (_, first) = ctx
        .request(
            "POST",
            "/v1/sprints",
            Some(json!({ "project_id": project_id, "start_date": "2026-02-02" })),
        )
        .await;
    let (_, second) = ctx
        .request(
            "POST",
            "/v1/sprints",
            Some(json!({ "project_id": project_id, "start_date": "2026-02-16" })),
        )
        .await;
    assert_eq!(second["sprint_number"], 2);

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/v1/sprints/{}", first["id"].as_str().unwrap()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // One survivor remains, so the next sprint is numbered count + 1 = 2
    let (status, third) = ctx
        .request(
            "POST",
            "/v1/sprints",
            Some(json!({ "project_id": project_id, "start_date": "2026-03-02" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(third["sprint_number"], 2);

    common::delete_test_project(&ctx, project_id).await;
    ctx.cleanup().await.unwrap();
}

/// Backlog creation appends at the top; reorder rewrites priorities
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_backlog_append_and_reorder() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = common::create_test_project(&ctx, "Backlog").await;

    let a = common::create_backlog_story(&ctx, project_id, "story a").await;
    let b = common::create_backlog_story(&ctx, project_id, "story b").await;
    let c = common::create_backlog_story(&ctx, project_id, "story c").await;

    // Newest first: each create takes max + 1
    let backlog_uri = format!("/v1/projects/{}/backlog", project_id);
    let (_, backlog) = ctx.request("GET", &backlog_uri, None).await;
    let titles: Vec<&str> = backlog
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["story c", "story b", "story a"]);

    // Reorder to a, c, b
    let (status, reordered) = ctx
        .request(
            "POST",
            &format!("{}/reorder", backlog_uri),
            Some(json!({ "story_ids": [a, c, b] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = reordered
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["story a", "story c", "story b"]);

    // Unknown id fails the whole call and writes nothing
    let (status, _) = ctx
        .request(
            "POST",
            &format!("{}/reorder", backlog_uri),
            Some(json!({ "story_ids": [a, uuid::Uuid::new_v4()] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, backlog) = ctx.request("GET", &backlog_uri, None).await;
    assert_eq!(
        backlog.as_array().unwrap()[0]["title"].as_str().unwrap(),
        "story a"
    );

    common::delete_test_project(&ctx, project_id).await;
    ctx.cleanup().await.unwrap();
}

/// Naming the same story twice in a reorder fails the whole call
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_reorder_rejects_duplicate_ids() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = common::create_test_project(&ctx, "Dups").await;

    let a = common::create_backlog_story(&ctx, project_id, "story a").await;
    let b = common::create_backlog_story(&ctx, project_id, "story b").await;

    let (status, _) = ctx
        .request(
            "POST",
            &format!("/v1/projects/{}/backlog/reorder", project_id),
            Some(json!({ "story_ids": [b, a, b] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing was written: creation order still holds
    let (_, backlog) = ctx
        .request("GET", &format!("/v1/projects/{}/backlog", project_id), None)
        .await;
    let titles: Vec<&str> = backlog
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["story b", "story a"]);

    common::delete_test_project(&ctx, project_id).await;
    ctx.cleanup().await.unwrap();
}

/// A reorder list naming another project's story fails the whole call
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_reorder_rejects_cross_project_ids() {
    let ctx = TestContext::new().await.unwrap();
    let project_a = common::create_test_project(&ctx, "Ours").await;
    let project_b = common::create_test_project(&ctx, "Theirs").await;

    let ours = common::create_backlog_story(&ctx, project_a, "ours").await;
    let theirs = common::create_backlog_story(&ctx, project_b, "theirs").await;

    let (status, _) = ctx
        .request(
            "POST",
            &format!("/v1/projects/{}/backlog/reorder", project_a),
            Some(json!({ "story_ids": [theirs, ours] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The foreign story kept its backlog position in its own project
    let (_, backlog_b) = ctx
        .request("GET", &format!("/v1/projects/{}/backlog", project_b), None)
        .await;
    assert_eq!(
        backlog_b.as_array().unwrap()[0]["title"].as_str().unwrap(),
        "theirs"
    );

    common::delete_test_project(&ctx, project_a).await;
    common::delete_test_project(&ctx, project_b).await;
    ctx.cleanup().await.unwrap();
}

/// Backlog creation rejects a sprint assignment outright
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_backlog_create_rejects_sprint_id() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = common::create_test_project(&ctx, "Strict").await;

    let (status, _) = ctx
        .request(
            "POST",
            &format!("/v1/projects/{}/backlog", project_id),
            Some(json!({ "title": "smuggled", "sprint_id": uuid::Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::delete_test_project(&ctx, project_id).await;
    ctx.cleanup().await.unwrap();
}

/// Stories move into a sprint and come back to the top of the backlog
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_story_sprint_moves() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = common::create_test_project(&ctx, "Moves").await;

    let (_, sprint) = ctx
        .request(
            "POST",
            "/v1/sprints",
            Some(json!({ "project_id": project_id, "start_date": "2026-04-06" })),
        )
        .await;
    let sprint_id = sprint["id"].as_str().unwrap();

    let a = common::create_backlog_story(&ctx, project_id, "first").await;
    let _b = common::create_backlog_story(&ctx, project_id, "second").await;

    let (status, assigned) = ctx
        .request(
            "POST",
            &format!("/v1/stories/{}/assign-sprint/{}", a, sprint_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["sprint_id"], *sprint_id);

    // Coming back, the story re-enters at the top
    let (status, unassigned) = ctx
        .request("POST", &format!("/v1/stories/{}/unassign-sprint", a), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(unassigned["sprint_id"].is_null());

    let (_, backlog) = ctx
        .request("GET", &format!("/v1/projects/{}/backlog", project_id), None)
        .await;
    assert_eq!(
        backlog.as_array().unwrap()[0]["title"].as_str().unwrap(),
        "first"
    );

    common::delete_test_project(&ctx, project_id).await;
    ctx.cleanup().await.unwrap();
}

/// A sprint from another project cannot hold this project's stories
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_cross_project_sprint_assignment_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let project_a = common::create_test_project(&ctx, "A").await;
    let project_b = common::create_test_project(&ctx, "B").await;

    let (_, sprint_b) = ctx
        .request(
            "POST",
            "/v1/sprints",
            Some(json!({ "project_id": project_b, "start_date": "2026-05-04" })),
        )
        .await;

    let story = common::create_backlog_story(&ctx, project_a, "stuck").await;

    let (status, _) = ctx
        .request(
            "POST",
            &format!(
                "/v1/stories/{}/assign-sprint/{}",
                story,
                sprint_b["id"].as_str().unwrap()
            ),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::delete_test_project(&ctx, project_a).await;
    common::delete_test_project(&ctx, project_b).await;
    ctx.cleanup().await.unwrap();
}

/// Toggling done twice restores the original value
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_story_toggle_done_roundtrip() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = common::create_test_project(&ctx, "Toggle").await;
    let story = common::create_backlog_story(&ctx, project_id, "flip me").await;
    let uri = format!("/v1/stories/{}/toggle-done", story);

    let (status, once) = ctx.request("POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(once["done"], true);

    let (_, twice) = ctx.request("POST", &uri, None).await;
    assert_eq!(twice["done"], false);

    common::delete_test_project(&ctx, project_id).await;
    ctx.cleanup().await.unwrap();
}

/// PATCH with an explicit null clears a field; an absent field stays
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_story_patch_null_semantics() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = common::create_test_project(&ctx, "Patch").await;

    let (_, story) = ctx
        .request(
            "POST",
            &format!("/v1/projects/{}/backlog", project_id),
            Some(json!({ "title": "estimate me", "points": 5 })),
        )
        .await;
    let story_id = story["id"].as_str().unwrap();
    let uri = format!("/v1/stories/{}", story_id);

    // Absent points: untouched
    let (status, patched) = ctx
        .request("PATCH", &uri, Some(json!({ "title": "renamed" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["title"], "renamed");
    assert_eq!(patched["points"], 5);

    // Explicit null: cleared
    let (_, patched) = ctx
        .request("PATCH", &uri, Some(json!({ "points": null })))
        .await;
    assert!(patched["points"].is_null());
    assert_eq!(patched["title"], "renamed");

    common::delete_test_project(&ctx, project_id).await;
    ctx.cleanup().await.unwrap();
}

/// Task CRUD under a story, with assignee clearing via null
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_task_lifecycle() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = common::create_test_project(&ctx, "Tasks").await;
    let story = common::create_backlog_story(&ctx, project_id, "parent").await;

    let (status, task) = ctx
        .request(
            "POST",
            "/v1/tasks",
            Some(json!({
                "story_id": story,
                "title": "write the thing",
                "assignee_id": ctx.user.id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["assignee_id"], ctx.user.id.to_string());
    let task_id = task["id"].as_str().unwrap();

    let (status, tasks) = ctx
        .request("GET", &format!("/v1/tasks?story_id={}", story), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().unwrap().len(), 1);

    // Unassign via explicit null
    let (_, patched) = ctx
        .request(
            "PATCH",
            &format!("/v1/tasks/{}", task_id),
            Some(json!({ "assignee_id": null })),
        )
        .await;
    assert!(patched["assignee_id"].is_null());

    let (_, toggled) = ctx
        .request("POST", &format!("/v1/tasks/{}/toggle-done", task_id), None)
        .await;
    assert_eq!(toggled["done"], true);

    let (status, _) = ctx
        .request("DELETE", &format!("/v1/tasks/{}", task_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    common::delete_test_project(&ctx, project_id).await;
    ctx.cleanup().await.unwrap();
}

/// Deleting a sprint returns its stories to the backlog
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_sprint_delete_detaches_stories() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = common::create_test_project(&ctx, "Detach").await;

    let (_, sprint) = ctx
        .request(
            "POST",
            "/v1/sprints",
            Some(json!({ "project_id": project_id, "start_date": "2026-06-01" })),
        )
        .await;
    let sprint_id = sprint["id"].as_str().unwrap();

    let story = common::create_backlog_story(&ctx, project_id, "survivor").await;
    ctx.request(
        "POST",
        &format!("/v1/stories/{}/assign-sprint/{}", story, sprint_id),
        None,
    )
    .await;

    let (status, _) = ctx
        .request("DELETE", &format!("/v1/sprints/{}", sprint_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, fetched) = ctx
        .request("GET", &format!("/v1/stories/{}", story), None)
        .await;
    assert!(fetched["sprint_id"].is_null());

    common::delete_test_project(&ctx, project_id).await;
    ctx.cleanup().await.unwrap();
}
