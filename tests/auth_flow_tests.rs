//! Full authentication flow against a live database.
//!
//! Run with: TEST_DATABASE_URL=... cargo test -- --ignored

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

mod common;
use common::{create_test_config, setup_test_db, test_router};

const UA: &str = "flow-test-agent";
const IP: &str = "203.0.113.7";

async fn flow_router() -> axum::Router {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;
    test_router(config, pool)
}

fn unique_email() -> String {
    format!("ann+{}@x.com", Uuid::new_v4().simple())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn session_cookie_from(response: &axum::response::Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("missing Set-Cookie")
        .to_str()
        .unwrap();

    let value = set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, v)| v.to_string())
        .expect("malformed Set-Cookie");

    value
}

async fn sign_up(router: &axum::Router, email: &str, password: &str) -> StatusCode {
    let payload = json!({"name": "Ann", "email": email, "password": password});

    router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/auth/sign-up")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

async fn sign_in(
    router: &axum::Router,
    email: &str,
    password: &str,
) -> axum::response::Response {
    let payload = json!({"email": email, "password": password});

    router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/auth/sign-in")
                .header(header::CONTENT_TYPE, "application/json")
                .header("user-agent", UA)
                .header("x-forwarded-for", IP)
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn refresh_with(
    router: &axum::Router,
    cookie: &str,
    user_agent: &str,
    ip: &str,
) -> axum::response::Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/auth/refresh")
                .header(header::COOKIE, format!("session={}", cookie))
                .header("user-agent", user_agent)
                .header("x-forwarded-for", ip)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_sign_up_then_sign_in_succeeds() {
    let router = flow_router().await;
    let email = unique_email();

    assert_eq!(sign_up(&router, &email, "password123").await, StatusCode::CREATED);

    let response = sign_in(&router, &email, "password123").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let token = body["accessToken"].as_str().unwrap();
    assert!(!token.is_empty());
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_duplicate_sign_up_fails() {
    let router = flow_router().await;
    let email = unique_email();

    assert_eq!(sign_up(&router, &email, "password123").await, StatusCode::CREATED);
    assert_eq!(sign_up(&router, &email, "password456").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_bad_credentials_are_indistinguishable() {
    let router = flow_router().await;
    let email = unique_email();

    assert_eq!(sign_up(&router, &email, "password123").await, StatusCode::CREATED);

    // Wrong password and unknown email produce the same status and message
    let wrong_password = sign_in(&router, &email, "wrong-password").await;
    assert_eq!(wrong_password.status(), StatusCode::BAD_REQUEST);
    let wrong_body = body_json(wrong_password).await;

    let unknown_email = sign_in(&router, &unique_email(), "password123").await;
    assert_eq!(unknown_email.status(), StatusCode::BAD_REQUEST);
    let unknown_body = body_json(unknown_email).await;

    assert_eq!(wrong_body["error"]["message"], unknown_body["error"]["message"]);
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_refresh_rotates_and_is_single_use() {
    let router = flow_router().await;
    let email = unique_email();

    sign_up(&router, &email, "password123").await;
    let response = sign_in(&router, &email, "password123").await;
    let cookie = session_cookie_from(&response);

    // First refresh succeeds and rotates the cookie
    let refreshed = refresh_with(&router, &cookie, UA, IP).await;
    assert_eq!(refreshed.status(), StatusCode::OK);
    let new_cookie = session_cookie_from(&refreshed);
    assert_ne!(new_cookie, cookie);

    let body = body_json(refreshed).await;
    assert!(!body["accessToken"].as_str().unwrap().is_empty());

    // The consumed token is dead
    let replay = refresh_with(&router, &cookie, UA, IP).await;
    assert_eq!(replay.status(), StatusCode::FORBIDDEN);

    // The rotated one still works
    let again = refresh_with(&router, &new_cookie, UA, IP).await;
    assert_eq!(again.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_refresh_with_mismatched_client_context_fails() {
    let router = flow_router().await;
    let email = unique_email();

    sign_up(&router, &email, "password123").await;

    let response = sign_in(&router, &email, "password123").await;
    let cookie = session_cookie_from(&response);
    let mismatched_ua = refresh_with(&router, &cookie, "other-agent", IP).await;
    assert_eq!(mismatched_ua.status(), StatusCode::FORBIDDEN);

    let response = sign_in(&router, &email, "password123").await;
    let cookie = session_cookie_from(&response);
    let mismatched_ip = refresh_with(&router, &cookie, UA, "198.51.100.9").await;
    assert_eq!(mismatched_ip.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_sign_out_revokes_the_session() {
    let router = flow_router().await;
    let email = unique_email();

    sign_up(&router, &email, "password123").await;
    let response = sign_in(&router, &email, "password123").await;
    let cookie = session_cookie_from(&response);

    let sign_out = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/auth/sign-out")
                .header(header::COOKIE, format!("session={}", cookie))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(sign_out.status(), StatusCode::OK);

    // The expiring cookie comes back regardless
    let set_cookie = sign_out
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("Max-Age=1"));

    let replay = refresh_with(&router, &cookie, UA, IP).await;
    assert_eq!(replay.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_partial_user_update_leaves_other_fields() {
    let router = flow_router().await;
    let email = unique_email();

    sign_up(&router, &email, "password123").await;
    let response = sign_in(&router, &email, "password123").await;
    let body = body_json(response).await;
    let token = body["accessToken"].as_str().unwrap().to_string();

    // The token carries the user id as its subject; fetch our own record
    let users = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/user/all")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let users = body_json(users).await;
    let me = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == email.as_str())
        .unwrap();
    let id = me["id"].as_str().unwrap();

    let update = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri(format!("/api/v1/user/{}", id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"name": "Renamed"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(update.status(), StatusCode::OK);

    let updated = body_json(update).await;
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["email"], email.as_str());

    // Sign-in with the unchanged password still works
    let again = sign_in(&router, &email, "password123").await;
    assert_eq!(again.status(), StatusCode::OK);
}
