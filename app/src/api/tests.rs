use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use domain::{core::Storefront, session::SessionConfig};
use in_memory_adapter::InMemoryStore;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::services::StorefrontHandle;

const DEMO_EMAIL: &str = "sueirodaniel04@gmail.com";
const DEMO_PASSWORD: &str = "12345678";

fn create_test_app() -> Router {
    let storefront = Storefront::new(
        Arc::new(InMemoryStore::new()),
        SessionConfig::default().with_latency(Duration::ZERO),
    );
    super::create_api(StorefrontHandle::new(storefront))
}

struct Reply {
    status: StatusCode,
    body: Value,
    /// `name=value` part of the `Set-Cookie` header
    cookie: Option<String>,
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let reply = send_as(app, None, method, uri, body).await;
    (reply.status, reply.body)
}

async fn send_as(
    app: &Router,
    cookie: Option<&str>,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Reply {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|value| value.to_str().unwrap().split(';').next().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(
            String::from_utf8_lossy(&body).into_owned(),
        ))
    };
    Reply {
        status,
        body: value,
        cookie,
    }
}

fn ids(products: &Value) -> Vec<u64> {
    products
        .as_array()
        .unwrap()
        .iter()
        .map(|product| product["id"].as_u64().unwrap())
        .collect()
}

/// Signs in as the demo shopper and returns the client cookie
async fn login_demo(app: &Router) -> String {
    let reply = send_as(
        app,
        None,
        Method::POST,
        "/api/session/login",
        Some(json!({ "email": DEMO_EMAIL, "password": DEMO_PASSWORD })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    reply.cookie.unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app();
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = create_test_app();
    let (status, body) = send(&app, Method::GET, "/apidoc/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/catalog"].is_object());
    assert!(body["paths"]["/api/session/login"].is_object());
}

#[tokio::test]
async fn test_list_products_unfiltered() {
    let app = create_test_app();
    let (status, body) = send(&app, Method::GET, "/api/catalog", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2, 3, 4]);
    assert_eq!(body[0]["title"], "Xperia Pro Max");
    assert_eq!(body[2]["in_stock"], false);
}

#[tokio::test]
async fn test_list_products_filtered() {
    let app = create_test_app();

    let (_, body) = send(&app, Method::GET, "/api/catalog?brand=Samsung", None).await;
    assert_eq!(ids(&body), vec![2]);

    let (_, body) = send(&app, Method::GET, "/api/catalog?price=300-600", None).await;
    assert_eq!(ids(&body), vec![2, 3, 4]);

    let (_, body) = send(&app, Method::GET, "/api/catalog?q=PIXEL", None).await;
    assert_eq!(ids(&body), vec![3]);

    // Surrounding spaces are part of the text query
    let (_, body) = send(&app, Method::GET, "/api/catalog?q=%20lite", None).await;
    assert_eq!(ids(&body), vec![3]);
    let (_, body) = send(&app, Method::GET, "/api/catalog?q=%20pixel", None).await;
    assert_eq!(ids(&body), Vec::<u64>::new());

    let (_, body) = send(&app, Method::GET, "/api/catalog?brand=Sony&price=under-300", None).await;
    assert_eq!(ids(&body), Vec::<u64>::new());

    // Unknown price ranges are ignored
    let (status, body) = send(&app, Method::GET, "/api/catalog?price=cheap", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_list_brands() {
    let app = create_test_app();
    let (status, body) = send(&app, Method::GET, "/api/catalog/brands", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["All", "Sony", "Samsung", "Google", "OnePlus"]));
}

#[tokio::test]
async fn test_purchase_requires_sign_in() {
    let app = create_test_app();
    let (status, body) = send(&app, Method::POST, "/api/catalog/1/purchase", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_purchase_after_login() {
    let app = create_test_app();
    let cookie = login_demo(&app).await;
    assert!(cookie.starts_with("storefront_client="));

    let reply = send_as(&app, Some(&cookie), Method::POST, "/api/catalog/1/purchase", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["receipt"]["product_id"], 1);
    assert_eq!(reply.body["receipt"]["buyer_email"], DEMO_EMAIL);
    assert_eq!(
        reply.body["message"],
        "Thanks Daniel Sueiro! Your purchase has been made, it will arrive in two days."
    );

    // The session survives the purchase
    let reply = send_as(&app, Some(&cookie), Method::GET, "/api/session", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["email"], DEMO_EMAIL);
}

#[tokio::test]
async fn test_sessions_are_per_client() {
    let app = create_test_app();
    let cookie = login_demo(&app).await;

    // A second client without the cookie is still anonymous
    let (status, body) = send(&app, Method::GET, "/api/session", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    let (status, _) = send(&app, Method::POST, "/api/catalog/1/purchase", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Another shopper signs in on their own client
    let other = send_as(
        &app,
        None,
        Method::POST,
        "/api/session/register",
        Some(json!({ "email": "ana@shop.test", "password": "secret", "name": "Ana" })),
    )
    .await;
    assert_eq!(other.status, StatusCode::CREATED);
    let other_cookie = other.cookie.unwrap();
    assert_ne!(other_cookie, cookie);

    let reply = send_as(&app, Some(&other_cookie), Method::GET, "/api/session", None).await;
    assert_eq!(reply.body["email"], "ana@shop.test");
    let reply = send_as(&app, Some(&cookie), Method::GET, "/api/session", None).await;
    assert_eq!(reply.body["email"], DEMO_EMAIL);

    // Logging out without the cookie or with the other one leaves this client alone
    let (status, _) = send(&app, Method::POST, "/api/session/logout", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    send_as(&app, Some(&other_cookie), Method::POST, "/api/session/logout", None).await;
    let reply = send_as(&app, Some(&cookie), Method::GET, "/api/session", None).await;
    assert_eq!(reply.status, StatusCode::OK);

    // A forged id is not a session
    let forged = format!("storefront_client={}", uuid::Uuid::new_v4());
    let reply = send_as(&app, Some(&forged), Method::GET, "/api/session", None).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_purchase_errors() {
    let app = create_test_app();
    let cookie = Some(login_demo(&app).await);

    let reply = send_as(&app, cookie.as_deref(), Method::POST, "/api/catalog/3/purchase", None).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    let reply = send_as(&app, cookie.as_deref(), Method::POST, "/api/catalog/99/purchase", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_starts_anonymous() {
    let app = create_test_app();
    let (status, body) = send(&app, Method::GET, "/api/session", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_login_rejections() {
    let app = create_test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/session/login",
        Some(json!({ "email": DEMO_EMAIL, "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Email or password incorrect.");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/session/login",
        Some(json!({ "email": "", "password": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "form");
    assert_eq!(
        body["fields"][0]["message"],
        "Please enter both email and password."
    );

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/session/login",
        Some(json!({ "email": "not-an-email", "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "email");

    let (status, _) = send(&app, Method::GET, "/api/session", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_malformed_json_uses_error_body() {
    let app = create_test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/session/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].is_string());

    // Missing fields and a missing content type keep the same shape
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/session/register",
        Some(json!({ "email": "ana@shop.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("password"));

    let (status, body) = send(&app, Method::POST, "/api/contact", None).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let app = create_test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/session/login",
        Some(json!({ "email": "SueiroDaniel04@Gmail.com", "password": DEMO_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], DEMO_EMAIL);
}

#[tokio::test]
async fn test_register_then_duplicate() {
    let app = create_test_app();

    let reply = send_as(
        &app,
        None,
        Method::POST,
        "/api/session/register",
        Some(json!({ "email": "ana@shop.test", "password": "secret", "name": "Ana" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["email"], "ana@shop.test");
    assert_eq!(reply.body["name"], "Ana");

    let cookie = reply.cookie;
    let reply = send_as(&app, cookie.as_deref(), Method::GET, "/api/session", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["name"], "Ana");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/session/register",
        Some(json!({ "email": "ANA@shop.test", "password": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "A user with this email already exists");
}

#[tokio::test]
async fn test_register_validation() {
    let app = create_test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/session/register",
        Some(json!({ "email": "ana@shop.test", "password": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["message"], "Email and password required");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/session/register",
        Some(json!({ "email": "ana@shop.test", "password": "secret", "name": "a".repeat(81) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "name");
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let app = create_test_app();
    let cookie = Some(login_demo(&app).await);

    let reply = send_as(&app, cookie.as_deref(), Method::POST, "/api/session/logout", None).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert_eq!(reply.cookie.as_deref(), Some("storefront_client="));
    let reply = send_as(&app, cookie.as_deref(), Method::POST, "/api/session/logout", None).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    let reply = send_as(&app, cookie.as_deref(), Method::GET, "/api/session", None).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    let reply = send_as(&app, cookie.as_deref(), Method::POST, "/api/catalog/1/purchase", None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_contact() {
    let app = create_test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/contact",
        Some(json!({
            "name": "Ana",
            "email": "ana@shop.test",
            "subject": "Repair / Service",
            "message": "My screen is cracked, can you fix it?",
            "phone": "+53 555 1234"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], "Repair / Service");
    assert_eq!(body["phone"], "+53 555 1234");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/contact",
        Some(json!({
            "name": "Ana",
            "email": "ana@shop.test",
            "subject": "Repair / Service",
            "message": "My screen is cracked, can you fix it?"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "phone");
}
