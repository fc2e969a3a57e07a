pub mod handlers;
pub mod templates;

#[cfg(test)]
mod tests;

use std::path::Path;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::services::StorefrontHandle;
use handlers::{
    confirm_purchase_page, contact_page, contact_submit, home, login_page, login_submit, logout,
    purchase_submit, register_page, register_submit,
};

// App state type
pub type AppState = StorefrontHandle;

pub fn create_app(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        // Static file serving
        .nest_service("/static", ServeDir::new(static_dir))
        // Storefront
        .route("/", get(home))
        .route(
            "/products/{product_id}/buy",
            get(confirm_purchase_page).post(purchase_submit),
        )
        .route("/contact", get(contact_page).post(contact_submit))
        // Authentication routes
        .route("/login", get(login_page).post(login_submit))
        .route("/register", get(register_page).post(register_submit))
        .route("/logout", post(logout))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add state
        .with_state(state)
}
