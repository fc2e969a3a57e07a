use std::{path::Path, sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use domain::{core::Storefront, session::SessionConfig};
use in_memory_adapter::InMemoryStore;
use tower::ServiceExt;

use crate::services::StorefrontHandle;

struct Page {
    status: StatusCode,
    location: Option<String>,
    /// `name=value` part of the `Set-Cookie` header
    cookie: Option<String>,
    body: String,
}

fn create_test_app() -> Router {
    let storefront = Storefront::new(
        Arc::new(InMemoryStore::new()),
        SessionConfig::default().with_latency(Duration::ZERO),
    );
    super::create_app(StorefrontHandle::new(storefront), Path::new("static"))
}

async fn request(
    app: &Router,
    cookie: Option<&str>,
    method: Method,
    uri: &str,
    form: Option<&str>,
) -> Page {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match form {
        Some(form) => builder
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|value| value.to_str().unwrap().to_string());
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|value| value.to_str().unwrap().split(';').next().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    Page {
        status,
        location,
        cookie,
        body: String::from_utf8(body.to_vec()).unwrap(),
    }
}

async fn get(app: &Router, uri: &str) -> Page {
    request(app, None, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, form: &str) -> Page {
    request(app, None, Method::POST, uri, Some(form)).await
}

async fn get_as(app: &Router, cookie: &str, uri: &str) -> Page {
    request(app, Some(cookie), Method::GET, uri, None).await
}

async fn post_as(app: &Router, cookie: &str, uri: &str, form: &str) -> Page {
    request(app, Some(cookie), Method::POST, uri, Some(form)).await
}

/// Signs in as the demo shopper and returns the client cookie
async fn login_demo(app: &Router) -> String {
    let page = post(
        app,
        "/login",
        "email=sueirodaniel04%40gmail.com&password=12345678",
    )
    .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    page.cookie.unwrap()
}

#[tokio::test]
async fn test_home_lists_all_products() {
    let app = create_test_app();
    let page = get(&app, "/").await;

    assert_eq!(page.status, StatusCode::OK);
    for title in ["Xperia Pro Max", "Galaxy Nova", "Pixel Lite", "OnePlus Swift"] {
        assert!(page.body.contains(title), "missing {title}");
    }
    assert!(page.body.contains("Out of stock"));
    assert!(page.body.contains("Login"));
    // Collapsed cards do not show specs
    assert!(!page.body.contains("5000 mAh"));
}

#[tokio::test]
async fn test_home_applies_filters() {
    let app = create_test_app();

    let page = get(&app, "/?brand=Google&price=all").await;
    assert!(page.body.contains("Pixel Lite"));
    assert!(!page.body.contains("Galaxy Nova"));

    let page = get(&app, "/?q=fast").await;
    assert!(page.body.contains("Pixel Lite"));
    assert!(page.body.contains("OnePlus Swift"));
    assert!(!page.body.contains("Xperia Pro Max"));

    let page = get(&app, "/?brand=Sony&price=under-300").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("No phones match these filters."));
}

#[tokio::test]
async fn test_home_expands_one_product() {
    let app = create_test_app();

    let page = get(&app, "/?open=1").await;
    assert!(page.body.contains("5000 mAh"));
    assert!(!page.body.contains("4300 mAh"));

    // An id outside the filtered list expands nothing
    let page = get(&app, "/?brand=Samsung&open=1").await;
    assert!(!page.body.contains("5000 mAh"));
}

#[tokio::test]
async fn test_anonymous_buy_redirects_to_login() {
    let app = create_test_app();

    let page = get(&app, "/products/1/buy").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(
        page.location.as_deref(),
        Some("/login?next=%2Fproducts%2F1%2Fbuy")
    );

    let page = post(&app, "/products/1/buy", "").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_then_buy() {
    let app = create_test_app();

    let page = post(
        &app,
        "/login",
        "email=sueirodaniel04%40gmail.com&password=12345678&next=%2Fproducts%2F1%2Fbuy",
    )
    .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location.as_deref(), Some("/products/1/buy"));
    let cookie = page.cookie.unwrap();

    let page = get_as(&app, &cookie, "/products/1/buy").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Buy Xperia Pro Max for $799?"));

    let page = post_as(&app, &cookie, "/products/1/buy", "").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(
        "Thanks Daniel Sueiro! Your purchase has been made, it will arrive in two days."
    ));
    assert!(page.body.contains("Hi, Daniel Sueiro"));
}

#[tokio::test]
async fn test_second_browser_stays_anonymous() {
    let app = create_test_app();
    let cookie = login_demo(&app).await;

    // A browser without the cookie is sent to sign in
    let page = get(&app, "/products/1/buy").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(
        page.location.as_deref(),
        Some("/login?next=%2Fproducts%2F1%2Fbuy")
    );
    let page = post(&app, "/products/1/buy", "").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    let page = get(&app, "/").await;
    assert!(!page.body.contains("Hi, Daniel Sueiro"));
    let page = get(&app, "/login").await;
    assert_eq!(page.status, StatusCode::OK);

    // Its logout does not end the first browser's session
    post(&app, "/logout", "").await;
    let page = get_as(&app, &cookie, "/products/1/buy").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Hi, Daniel Sueiro"));
}

#[tokio::test]
async fn test_buy_errors() {
    let app = create_test_app();
    let cookie = login_demo(&app).await;

    let page = get_as(&app, &cookie, "/products/3/buy").await;
    assert_eq!(page.status, StatusCode::CONFLICT);
    assert!(page.body.contains("Pixel Lite is out of stock"));

    let page = post_as(&app, &cookie, "/products/3/buy", "").await;
    assert_eq!(page.status, StatusCode::CONFLICT);

    let page = get_as(&app, &cookie, "/products/42/buy").await;
    assert_eq!(page.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_errors_rerender_form() {
    let app = create_test_app();

    let page = post(&app, "/login", "email=&password=").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Please enter both email and password."));

    let page = post(&app, "/login", "email=nope&password=secret").await;
    assert!(page.body.contains("Please enter a valid email address."));

    let page = post(
        &app,
        "/login",
        "email=sueirodaniel04%40gmail.com&password=wrong",
    )
    .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Email or password incorrect."));
}

#[tokio::test]
async fn test_external_next_is_ignored() {
    let app = create_test_app();
    let page = post(
        &app,
        "/login",
        "email=sueirodaniel04%40gmail.com&password=12345678&next=https%3A%2F%2Fevil.test",
    )
    .await;
    assert_eq!(page.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn test_register_and_logout() {
    let app = create_test_app();

    let page = post(&app, "/register", "email=ana%40shop.test&password=secret&name=Ana").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    let cookie = page.cookie.unwrap();

    let page = get_as(&app, &cookie, "/").await;
    assert!(page.body.contains("Hi, Ana"));

    // Signed-in shoppers skip the sign-in page
    let page = get_as(&app, &cookie, "/login").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);

    let page = post_as(&app, &cookie, "/logout", "").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.cookie.as_deref(), Some("storefront_client="));
    let page = get_as(&app, &cookie, "/").await;
    assert!(!page.body.contains("Hi, Ana"));

    let page = post(&app, "/register", "email=ANA%40shop.test&password=other&name=").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("A user with this email already exists"));

    let page = post(&app, "/register", "email=&password=&name=").await;
    assert!(page.body.contains("Email and password required"));
}

#[tokio::test]
async fn test_contact_form() {
    let app = create_test_app();

    let page = get(&app, "/contact").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Send a Message"));

    let page = post(
        &app,
        "/contact",
        "name=A&email=bad&subject=Warranty&message=short",
    )
    .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Please enter your name (at least 2 characters)."));
    assert!(page.body.contains("Please enter a valid email address."));
    assert!(page.body.contains("Please provide your order number (at least 4 characters)."));
    assert!(!page.body.contains("Thank you!"));

    let page = post(
        &app,
        "/contact",
        "name=Ana&email=ana%40shop.test&subject=Other&message=Do+you+sell+refurbished+phones%3F",
    )
    .await;
    assert!(page.body.contains("Thank you! Your message has been sent successfully."));
}
