use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use linkarr::config::Config;
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.server.secure_cookies = false;
    // Low-cost hashing keeps the suite fast
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = linkarr::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    linkarr::api::router(state)
        .await
        .expect("Failed to build router")
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Extract the session cookie pair from a login/register response.
fn session_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Response should set a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a user and return their session cookie.
async fn register(app: &Router, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/register",
            serde_json::json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "password1",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    session_cookie(&response)
}

/// Log in as the migration-seeded admin account.
async fn login_admin(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            serde_json::json!({ "username": "admin", "password": "admin" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response)
}

async fn create_bookmark(app: &Router, cookie: &str, title: &str, is_public: bool) -> i64 {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookmarks")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, cookie)
                .body(Body::from(
                    serde_json::json!({
                        "title": title,
                        "url": "https://example.com/page",
                        "isPublic": is_public,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_register_and_login_flow() {
    let app = spawn_app().await;

    let cookie = register(&app, "alice").await;

    // The session from registration is live
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["isAdmin"], false);

    // Anonymous /me is 200 with null data
    let response = app.clone().oneshot(get_request("/api/auth/me")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"].is_null());

    // Duplicate username is a validation error
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/register",
            serde_json::json!({
                "username": "alice",
                "email": "alice2@example.com",
                "password": "password1",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Login failures do not reveal whether the account exists
    let wrong_password = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            serde_json::json!({ "username": "alice", "password": "wrong-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password = body_json(wrong_password).await;

    let unknown_user = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            serde_json::json!({ "username": "nobody", "password": "wrong-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    let unknown_user = body_json(unknown_user).await;

    assert_eq!(wrong_password["error"], unknown_user["error"]);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = spawn_app().await;
    let cookie = register(&app, "alice").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_bookmark_listing_auth_rules() {
    let app = spawn_app().await;

    // Private scope requires authentication
    let response = app.clone().oneshot(get_request("/api/bookmarks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The public feed is open to everyone
    let response = app
        .clone()
        .oneshot(get_request("/api/bookmarks?isPublic=true"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Creating requires authentication
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/bookmarks",
            serde_json::json!({ "title": "x", "url": "https://example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_feed_excludes_private() {
    let app = spawn_app().await;
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    create_bookmark(&app, &alice, "Alice public", true).await;
    create_bookmark(&app, &alice, "Alice private", false).await;
    create_bookmark(&app, &bob, "Bob public", true).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/bookmarks?isPublic=true&page=1&limit=10"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["totalPages"], 1);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    for item in items {
        assert_eq!(item["isPublic"], true);
        assert!(item["username"].is_string());
    }

    // Alice's own listing sees both of her bookmarks and none of Bob's
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/bookmarks")
                .header(header::COOKIE, &alice)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn test_bookmark_ownership_and_admin_override() {
    let app = spawn_app().await;
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let admin = login_admin(&app).await;

    let id = create_bookmark(&app, &alice, "Alice's bookmark", false).await;

    let patch = |cookie: &str, id: i64, title: &str| {
        Request::builder()
            .method("PATCH")
            .uri(format!("/api/bookmarks/{id}"))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, cookie)
            .body(Body::from(serde_json::json!({ "title": title }).to_string()))
            .unwrap()
    };

    // Anonymous write on an existing bookmark is 401
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/bookmarks/{id}"),
            serde_json::json!({ "title": "nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Another non-admin user is 403
    let response = app.clone().oneshot(patch(&bob, id, "hijack")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A missing bookmark is 404 even for a caller who would be forbidden
    let response = app.clone().oneshot(patch(&bob, 99999, "ghost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The admin may edit regardless of ownership
    let response = app
        .clone()
        .oneshot(patch(&admin, id, "Renamed by admin"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "Renamed by admin");

    // Private read: owner yes, stranger no, anonymous no
    let read = |cookie: Option<&str>| {
        let mut builder = Request::builder().uri(format!("/api/bookmarks/{id}"));
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    };
    let response = app.clone().oneshot(read(Some(&alice))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.clone().oneshot(read(Some(&bob))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = app.clone().oneshot(read(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Deletion follows the same policy
    let delete = |cookie: &str| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/bookmarks/{id}"))
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    };
    let response = app.clone().oneshot(delete(&bob)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = app.clone().oneshot(delete(&alice)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.clone().oneshot(delete(&alice)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bookmark_validation() {
    let app = spawn_app().await;
    let alice = register(&app, "alice").await;

    let create = |body: serde_json::Value| {
        Request::builder()
            .method("POST")
            .uri("/api/bookmarks")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, &alice)
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(create(
            serde_json::json!({ "title": "", "url": "https://example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(create(serde_json::json!({ "title": "x", "url": "not a url" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bearer_token_flow() {
    let app = spawn_app().await;
    let cookie = register(&app, "alice").await;
    create_bookmark(&app, &cookie, "Mine", false).await;

    // Issue a token over the session
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/tokens")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, &cookie)
                .body(Body::from(serde_json::json!({ "label": "cli" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 64);
    let token_id = body["data"]["id"].as_i64().unwrap();

    // The token authenticates API reads without a session
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/bookmarks")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 1);

    // Token listing shows the stored value again
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/tokens")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["token"], token);
    assert_eq!(body["data"][0]["label"], "cli");

    // Revoke, then the token no longer authenticates
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/tokens/{token_id}"))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/bookmarks")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_bearer_never_falls_back_to_session() {
    let app = spawn_app().await;
    let cookie = register(&app, "alice").await;

    // A valid session alongside a bad bearer header must not authenticate
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/tokens")
                .header(header::COOKIE, &cookie)
                .header(header::AUTHORIZATION, "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_password_rotation() {
    let app = spawn_app().await;
    let alice = register(&app, "alice").await;
    let admin = login_admin(&app).await;

    let change = |cookie: &str, current: &str, new: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/admin/password")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, cookie)
            .body(Body::from(
                serde_json::json!({ "currentPassword": current, "newPassword": new }).to_string(),
            ))
            .unwrap()
    };

    // Anonymous is 401, plain users are 403
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/password",
            serde_json::json!({ "currentPassword": "admin", "newPassword": "changed-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(change(&alice, "admin", "changed-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Wrong current password is rejected
    let response = app
        .clone()
        .oneshot(change(&admin, "wrong", "changed-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct rotation succeeds exactly once per value
    let response = app
        .clone()
        .oneshot(change(&admin, "admin", "changed-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(change(&admin, "admin", "changed-2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(change(&admin, "changed-1", "changed-2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_system_status() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/api/system/status"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = register(&app, "alice").await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["databaseOk"], true);
    assert!(body["data"]["version"].is_string());
}
