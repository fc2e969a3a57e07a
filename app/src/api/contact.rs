use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use domain::contact::{ContactForm, ContactRequest};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::{ApiJson, AppState, ErrorResponse};

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(submit_contact))
}

/// Send a contact request
///
/// The order number, phone and product model fields are only required for
/// the subjects that ask for them. Accepted requests are logged, not mailed.
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactForm,
    responses(
        (status = 200, description = "Request accepted", body = ContactRequest),
        (status = 422, description = "Some fields are invalid", body = ErrorResponse)
    ),
    tag = super::CONTACT_TAG
)]
async fn submit_contact(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<ContactForm>,
) -> impl IntoResponse {
    match state.lock().await.submit_contact(&form) {
        Ok(request) => Json(request).into_response(),
        Err(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::from(errors)),
        )
            .into_response(),
    }
}
