mod common;

use axum::http::header;
use common::{InMemoryRepo, json_body, session_cookie, spawn_app, spawn_app_with};
use serde_json::json;
use spot_gate::{models::Role, session::SessionStore};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app();
    let response = app.get("/public/health", None).await;
    assert_eq!(response.status(), 200);
    assert_eq!(json_body(response).await, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_register_login_me_logout_scenario() {
    let app = spawn_app();

    // Register
    let response = app
        .post_json(
            "/register",
            json!({
                "email": "a@b.com",
                "password": "Abcdefg1",
                "confirmPassword": "Abcdefg1"
            }),
            None,
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = json_body(response).await;
    assert_eq!(body["user"]["email"], "a@b.com");
    assert_eq!(body["user"]["role"], "user");

    // Login
    let response = app
        .post_json(
            "/login",
            json!({ "email": "a@b.com", "password": "Abcdefg1" }),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    let cookie = session_cookie(&response).unwrap();
    assert_eq!(json_body(response).await["message"], "Login successful");

    // Me
    let response = app.get("/me", Some(&cookie)).await;
    assert_eq!(response.status(), 200);
    let me = json_body(response).await;
    assert_eq!(me["email"], "a@b.com");
    assert_eq!(me["role"], "user");

    // Logout
    let response = app.get("/logout", Some(&cookie)).await;
    assert_eq!(response.status(), 200);
    let cleared = session_cookie(&response).unwrap();
    assert_eq!(cleared, "session_id=");
    assert_eq!(json_body(response).await["message"], "Logout successful");

    // The old cookie is dead.
    assert_eq!(app.get("/me", Some(&cookie)).await.status(), 401);
    assert!(app.sessions.is_empty());
}

#[tokio::test]
async fn test_register_policy_and_format_errors() {
    let app = spawn_app();
    let cases = [
        (json!({ "email": "", "password": "Abcdefg1", "confirmPassword": "Abcdefg1" }), "Missing required fields"),
        (json!({ "email": "nope", "password": "Abcdefg1", "confirmPassword": "Abcdefg1" }), "Invalid email format"),
        (json!({ "email": "a@b.com", "password": "Abcdefg1", "confirmPassword": "Abcdefg2" }), "Passwords do not match"),
        (json!({ "email": "a@b.com", "password": "Abc1", "confirmPassword": "Abc1" }), "Password must be at least 8 characters"),
        (json!({ "email": "a@b.com", "password": "abcdefg1", "confirmPassword": "abcdefg1" }), "Password must have at least one uppercase letter"),
        (json!({ "email": "a@b.com", "password": "Abcdefgh", "confirmPassword": "Abcdefgh" }), "Password must have at least one digit"),
    ];

    for (payload, message) in cases {
        let response = app.post_json("/register", payload, None).await;
        assert_eq!(response.status(), 400, "{message}");
        assert_eq!(json_body(response).await["error"], message);
    }
    assert_eq!(app.repo.user_count(), 0);
}

#[tokio::test]
async fn test_register_duplicate_email_is_conflict() {
    let app = spawn_app();
    let payload = json!({
        "email": "dup@example.com",
        "password": "Abcdefg1",
        "confirm_password": "Abcdefg1"
    });
    assert_eq!(
        app.post_json("/register", payload.clone(), None).await.status(),
        201
    );
    assert_eq!(app.post_json("/register", payload, None).await.status(), 409);
    assert_eq!(app.repo.user_count(), 1);
}

#[tokio::test]
async fn test_login_bad_credentials_are_indistinguishable() {
    let app = spawn_app();
    app.login_as("known@example.com", "Abcdefg1").await;

    let wrong_password = app
        .post_json(
            "/login",
            json!({ "email": "known@example.com", "password": "Wrong1234" }),
            None,
        )
        .await;
    let unknown_email = app
        .post_json(
            "/login",
            json!({ "email": "ghost@example.com", "password": "Abcdefg1" }),
            None,
        )
        .await;

    assert_eq!(wrong_password.status(), 401);
    assert_eq!(unknown_email.status(), 401);
    assert!(wrong_password.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(
        json_body(wrong_password).await,
        json_body(unknown_email).await
    );
}

#[tokio::test]
async fn test_login_rotates_stale_cookie() {
    let app = spawn_app();
    app.login_as("a@b.com", "Abcdefg1").await;
    assert_eq!(app.sessions.len(), 1);

    // An anonymous session passes the guest guard and is dropped on login.
    let planted = app
        .sessions
        .create(0, Role::User, "")
        .await
        .map(|t| format!("session_id={}", t.as_str()))
        .unwrap();
    let response = app
        .post_json(
            "/login",
            json!({ "email": "a@b.com", "password": "Abcdefg1" }),
            Some(&planted),
        )
        .await;
    assert_eq!(response.status(), 200);
    let fresh = session_cookie(&response).unwrap();
    assert_ne!(fresh, planted);
    // The planted entry is gone; the first login's session and the new one remain.
    assert_eq!(app.sessions.len(), 2);
}

#[tokio::test]
async fn test_logged_in_user_cannot_login_again() {
    let app = spawn_app();
    let cookie = app.login_as("a@b.com", "Abcdefg1").await;
    let response = app
        .post_json(
            "/login",
            json!({ "email": "a@b.com", "password": "Abcdefg1" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_public_spots_exclude_secret_tier() {
    let app = spawn_app();
    let body = json_body(app.get("/spots", None).await).await;
    let categories: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["category"].as_str().unwrap())
        .collect();
    assert_eq!(categories, vec!["Gamta", "Lauko_treniruokliai"]);
}

#[tokio::test]
async fn test_all_spots_for_logged_in_user() {
    let app = spawn_app();
    let cookie = app.login_as("a@b.com", "Abcdefg1").await;
    let body = json_body(app.get("/spots/all", Some(&cookie)).await).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_admin_creates_spot() {
    let app = spawn_app();
    let token = app
        .sessions
        .create(1, Role::Admin, "admin@example.com")
        .await
        .unwrap();
    let cookie = format!("session_id={}", token.as_str());

    let created = app
        .post_json(
            "/admin/spots",
            json!({
                "category": "Slaptos_vietos",
                "name": "Rooftop",
                "description": "Ask the janitor",
                "location_id": 1
            }),
            Some(&cookie),
        )
        .await;
    assert_eq!(created.status(), 201);
    assert_eq!(json_body(created).await["category"], "Slaptos_vietos");

    let invalid = app
        .post_json(
            "/admin/spots",
            json!({
                "category": "Gamta",
                "name": "",
                "description": "x",
                "location_id": 1
            }),
            Some(&cookie),
        )
        .await;
    assert_eq!(invalid.status(), 400);

    let dangling = app
        .post_json(
            "/admin/spots",
            json!({
                "category": "Gamta",
                "name": "Lost",
                "description": "x",
                "location_id": 77
            }),
            Some(&cookie),
        )
        .await;
    assert_eq!(dangling.status(), 400);
}

#[tokio::test]
async fn test_locations_are_public_to_read() {
    let app = spawn_app();
    assert_eq!(app.get("/locations", None).await.status(), 200);
    assert_eq!(app.get("/locations/1", None).await.status(), 200);
    assert_eq!(app.get("/locations/9", None).await.status(), 404);
}

#[tokio::test]
async fn test_repository_failure_surfaces_as_generic_500() {
    let repo = InMemoryRepo::seeded();
    repo.broken.store(true, Ordering::SeqCst);
    let app = spawn_app_with(repo);

    let response = app.get("/spots", None).await;
    assert_eq!(response.status(), 500);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Internal server error" })
    );
}

#[tokio::test]
async fn test_register_missing_confirmation_is_json_400() {
    let app = spawn_app();
    let response = app
        .post_json(
            "/register",
            json!({ "email": "a@b.com", "password": "Abcdefg1" }),
            None,
        )
        .await;
    assert_eq!(response.status(), 400);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("confirmPassword"));
    assert_eq!(app.repo.user_count(), 0);
}

#[tokio::test]
async fn test_broken_json_body_is_json_400() {
    let app = spawn_app();
    let response = app.post_raw("/login", "{not json", None).await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Invalid JSON format" })
    );
}

#[tokio::test]
async fn test_unknown_category_in_admin_create_is_json_400() {
    let app = spawn_app();
    let token = app
        .sessions
        .create(1, Role::Admin, "admin@example.com")
        .await
        .unwrap();
    let cookie = format!("session_id={}", token.as_str());

    let response = app
        .post_json(
            "/admin/spots",
            json!({
                "category": "Beaches",
                "name": "Shore",
                "description": "Sand",
                "location_id": 1
            }),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), 400);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn test_non_numeric_id_is_json_400() {
    let app = spawn_app();
    for uri in ["/spots/abc", "/locations/abc"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), 400, "{uri}");
        assert!(json_body(response).await["error"].is_string());
    }
}
