use axum::{
    Json, Router,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use domain::validation::FormErrors;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::{OpenApi, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_swagger_ui::SwaggerUi;

use crate::services::StorefrontHandle;

mod catalog;
mod contact;
mod session;

#[cfg(test)]
mod tests;

const CATALOG_TAG: &str = "catalog";
const SESSION_TAG: &str = "session";
const CONTACT_TAG: &str = "contact";

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
    ),
    components(
        schemas(
            ErrorResponse,
            FieldError,
            session::LoginRequest,
            session::RegisterRequest
        )
    ),
    tags(
        (name = CATALOG_TAG, description = "Catalog API endpoints"),
        (name = SESSION_TAG, description = "Session API endpoints"),
        (name = CONTACT_TAG, description = "Contact form API endpoints")
    )
)]
struct ApiDoc;

/// Body of every non-2xx JSON response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: Vec::new(),
        }
    }
}

impl From<FormErrors> for ErrorResponse {
    fn from(errors: FormErrors) -> Self {
        Self {
            error: String::from("Invalid form data"),
            fields: errors
                .iter()
                .map(|error| FieldError {
                    field: error.field.to_string(),
                    message: error.message.clone(),
                })
                .collect(),
        }
    }
}

impl From<validator::ValidationErrors> for ErrorResponse {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map_or_else(|| error.code.to_string(), ToString::to_string),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        Self {
            error: String::from("Invalid request data"),
            fields,
        }
    }
}

/// JSON body extractor whose rejections are `ErrorResponse` bodies, so a
/// malformed or mistyped payload gets the same shape as every other error
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!("Rejected JSON body: {rejection}");
                Err((
                    rejection.status(),
                    Json(ErrorResponse::new(rejection.body_text())),
                ))
            }
        }
    }
}

/// Get health of the API.
#[utoipa::path(
    method(get, head),
    path = "/api/health",
    responses(
        (status = OK, description = "Success", body = str, content_type = "text/plain")
    )
)]
async fn health() -> &'static str {
    "ok"
}

pub type AppState = StorefrontHandle;

pub fn create_api(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(health))
        .merge(catalog::router())
        .merge(session::router())
        .merge(contact::router())
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/apidoc/openapi.json", api))
        .with_state(state)
}
