use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use tasktrack::{app::build_app, state::AppState};

async fn test_app() -> Router {
    let state = AppState::in_memory().await.expect("in-memory state");
    build_app(state).await.expect("build app")
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

async fn register(app: &Router, name: &str, email: &str, password: &str) -> String {
    let response = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "name": name,
            "email": email,
            "password": password,
            "password_confirmation": password,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    session_cookie(&response)
}

async fn create_task(app: &Router, cookie: &str, body: Value) -> Value {
    let response = send(app, Method::POST, "/tasks", Some(cookie), Some(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

#[tokio::test]
async fn health_endpoint_answers() {
    let app = test_app().await;
    let response = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_establishes_a_session_and_hides_the_password() {
    let app = test_app().await;
    let response = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "name": "Ann",
            "email": "ann@example.com",
            "password": "secret1",
            "password_confirmation": "secret1",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = session_cookie(&response);
    let body = json_body(response).await;
    assert_eq!(body["name"], "Ann");
    assert_eq!(body["email"], "ann@example.com");
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    // The fresh session already grants access to task routes.
    let response = send(&app, Method::GET, "/tasks", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_reports_field_level_validation_errors() {
    let app = test_app().await;
    let response = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "name": "",
            "email": "not-an-email",
            "password": "abc",
            "password_confirmation": "xyz",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    let errors = body["errors"].as_object().unwrap();
    assert!(errors.contains_key("name"));
    assert!(errors.contains_key("email"));
    assert!(errors.contains_key("password"));
    assert!(errors.contains_key("password_confirmation"));
}

#[tokio::test]
async fn register_rejects_duplicate_emails() {
    let app = test_app().await;
    register(&app, "Ann", "ann@example.com", "secret1").await;

    let response = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "name": "Impostor",
            "email": "ann@example.com",
            "password": "secret2",
            "password_confirmation": "secret2",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    assert!(body["errors"]["email"].is_string());
}

#[tokio::test]
async fn login_failure_does_not_say_which_field_was_wrong() {
    let app = test_app().await;
    register(&app, "Ann", "ann@example.com", "secret1").await;

    let wrong_password = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "ann@example.com", "password": "secret2"})),
    )
    .await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);

    let unknown_email = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "nobody@example.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

    // Same generic body either way.
    let a = json_body(wrong_password).await;
    let b = json_body(unknown_email).await;
    assert_eq!(a, b);
    assert_eq!(a["error"], "Invalid credentials");
}

#[tokio::test]
async fn login_with_correct_credentials_grants_access() {
    let app = test_app().await;
    register(&app, "Ann", "ann@example.com", "secret1").await;

    let response = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "ann@example.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = session_cookie(&response);
    let response = send(&app, Method::GET, "/me", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["email"], "ann@example.com");
}

#[tokio::test]
async fn unauthenticated_task_requests_are_steered_to_login() {
    let app = test_app().await;

    for (method, uri) in [
        (Method::GET, "/tasks"),
        (Method::GET, "/tasks/stats"),
        (Method::GET, "/tasks/attention"),
        (Method::GET, "/me"),
    ] {
        let response = send(&app, method, uri, None, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }
}

#[tokio::test]
async fn logout_invalidates_the_old_session() {
    let app = test_app().await;
    let cookie = register(&app, "Ann", "ann@example.com", "secret1").await;

    let response = send(&app, Method::POST, "/auth/logout", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The old session id no longer authenticates anything.
    let response = send(&app, Method::GET, "/tasks", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn create_task_validates_title_and_due_date() {
    let app = test_app().await;
    let cookie = register(&app, "Ann", "ann@example.com", "secret1").await;

    let response = send(
        &app,
        Method::POST,
        "/tasks",
        Some(&cookie),
        Some(json!({"title": "   ", "priority": "low"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["errors"]["title"].is_string());

    let response = send(
        &app,
        Method::POST,
        "/tasks",
        Some(&cookie),
        Some(json!({"title": "Late", "priority": "low", "due_date": "2020-01-01"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["errors"]["due_date"].is_string());

    // No due date at all is fine.
    let task = create_task(
        &app,
        &cookie,
        json!({"title": "No deadline", "priority": "low"}),
    )
    .await;
    assert_eq!(task["status"], "pending");
    assert!(task["due_date"].is_null());
}

#[tokio::test]
async fn task_lifecycle_scenario() {
    let app = test_app().await;
    let cookie = register(&app, "Ann", "a@x.com", "secret1").await;

    let response = send(
        &app,
        Method::POST,
        "/tasks",
        Some(&cookie),
        Some(json!({"title": "Write spec", "priority": "high"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().get(header::LOCATION).is_some());
    let task = json_body(response).await;
    assert_eq!(task["title"], "Write spec");
    assert_eq!(task["priority"], "high");
    assert_eq!(task["status"], "pending");
    let id = task["id"].as_str().unwrap().to_string();

    let response = send(&app, Method::GET, "/tasks", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = json_body(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["status"], "pending");

    let response = send(
        &app,
        Method::PATCH,
        &format!("/tasks/{id}/status"),
        Some(&cookie),
        Some(json!({"status": "in_progress"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let toggle = json_body(response).await;
    assert_eq!(toggle["success"], true);

    let response = send(&app, Method::GET, "/tasks/stats", Some(&cookie), None).await;
    let stats = json_body(response).await;
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["pending"], 0);
    assert_eq!(stats["in_progress"], 1);
    assert_eq!(stats["completed"], 0);

    let response = send(
        &app,
        Method::DELETE,
        &format!("/tasks/{id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, Method::GET, "/tasks", Some(&cookie), None).await;
    let listed = json_body(response).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn tasks_are_invisible_across_users() {
    let app = test_app().await;
    let alice = register(&app, "Alice", "alice@x.com", "secret1").await;
    let task = create_task(
        &app,
        &alice,
        json!({"title": "Private plans", "priority": "high"}),
    )
    .await;
    let id = task["id"].as_str().unwrap().to_string();

    let bob = register(&app, "Bob", "bob@x.com", "secret1").await;

    let response = send(&app, Method::GET, &format!("/tasks/{id}"), Some(&bob), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    // The body must not leak anything about the foreign task.
    assert_eq!(body, json!({"error": "Task not found"}));

    let response = send(
        &app,
        Method::PUT,
        &format!("/tasks/{id}"),
        Some(&bob),
        Some(json!({"title": "Hijacked", "status": "completed", "priority": "low"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        Method::PATCH,
        &format!("/tasks/{id}/status"),
        Some(&bob),
        Some(json!({"status": "completed"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let toggle = json_body(response).await;
    assert_eq!(toggle["success"], false);

    let response = send(
        &app,
        Method::DELETE,
        &format!("/tasks/{id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Alice's task survived all of it, untouched.
    let response = send(&app, Method::GET, &format!("/tasks/{id}"), Some(&alice), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let reloaded = json_body(response).await;
    assert_eq!(reloaded["title"], "Private plans");
    assert_eq!(reloaded["status"], "pending");
}

#[tokio::test]
async fn full_update_replaces_every_field() {
    let app = test_app().await;
    let cookie = register(&app, "Ann", "ann@example.com", "secret1").await;
    let task = create_task(&app, &cookie, json!({"title": "Draft", "priority": "low"})).await;
    let id = task["id"].as_str().unwrap().to_string();

    let response = send(
        &app,
        Method::PUT,
        &format!("/tasks/{id}"),
        Some(&cookie),
        Some(json!({
            "title": "Final",
            "description": "polished",
            "status": "completed",
            "priority": "high",
            "due_date": "2099-01-01",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["title"], "Final");
    assert_eq!(updated["description"], "polished");
    assert_eq!(updated["status"], "completed");
    assert_eq!(updated["priority"], "high");
    assert_eq!(updated["due_date"], "2099-01-01");

    // Update enforces the same due-date rule as create.
    let response = send(
        &app,
        Method::PUT,
        &format!("/tasks/{id}"),
        Some(&cookie),
        Some(json!({
            "title": "Final",
            "status": "completed",
            "priority": "high",
            "due_date": "2020-01-01",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Blank title is still rejected.
    let response = send(
        &app,
        Method::PUT,
        &format!("/tasks/{id}"),
        Some(&cookie),
        Some(json!({"title": "", "status": "pending", "priority": "low"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Unknown id is a plain not-found.
    let response = send(
        &app,
        Method::PUT,
        "/tasks/00000000-0000-0000-0000-000000000000",
        Some(&cookie),
        Some(json!({"title": "Ghost", "status": "pending", "priority": "low"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filter_restricts_to_one_status() {
    let app = test_app().await;
    let cookie = register(&app, "Ann", "ann@example.com", "secret1").await;

    let done = create_task(&app, &cookie, json!({"title": "Done", "priority": "low"})).await;
    create_task(&app, &cookie, json!({"title": "Open", "priority": "low"})).await;
    let done_id = done["id"].as_str().unwrap().to_string();

    send(
        &app,
        Method::PATCH,
        &format!("/tasks/{done_id}/status"),
        Some(&cookie),
        Some(json!({"status": "completed"})),
    )
    .await;

    let response = send(
        &app,
        Method::GET,
        "/tasks?status=completed",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = json_body(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["title"], "Done");

    // A status nobody has yet is an empty list, not an error.
    let response = send(
        &app,
        Method::GET,
        "/tasks?status=in_progress",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = json_body(response).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn attention_and_detailed_stats_report_urgent_work() {
    let app = test_app().await;
    let cookie = register(&app, "Ann", "ann@example.com", "secret1").await;

    let hot = create_task(&app, &cookie, json!({"title": "Hot", "priority": "high"})).await;
    let hot_id = hot["id"].as_str().unwrap().to_string();
    create_task(&app, &cookie, json!({"title": "Todo", "priority": "low"})).await;
    send(
        &app,
        Method::PATCH,
        &format!("/tasks/{hot_id}/status"),
        Some(&cookie),
        Some(json!({"status": "in_progress"})),
    )
    .await;

    let response = send(&app, Method::GET, "/tasks/attention", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let attention = json_body(response).await;
    let items = attention.as_array().unwrap();
    assert_eq!(items.len(), 2);
    // High-priority in-progress work sorts above pending low-priority work.
    assert_eq!(items[0]["title"], "Hot");
    assert_eq!(items[0]["urgency"], "normal");

    let response = send(
        &app,
        Method::GET,
        "/tasks/stats/detailed",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats = json_body(response).await;
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["high_priority"], 1);
    assert_eq!(stats["overdue"], 0);
    assert_eq!(stats["completed"], 0);
    assert!(stats["avg_completion_days"].is_null());
}
