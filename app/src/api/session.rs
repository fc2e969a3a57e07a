use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use domain::user::{AuthError, Session};
use domain::validation::{validate_login, validate_registration};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use validator::Validate;

use super::{ApiJson, AppState, ErrorResponse};
use crate::services::client::{ClientCookie, clear_client_cookie, client_cookie};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(max = 254, message = "Email is too long"))]
    pub email: String,
    #[validate(length(max = 128, message = "Password is too long"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(max = 254, message = "Email is too long"))]
    pub email: String,
    #[validate(length(max = 128, message = "Password is too long"))]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 80, message = "Name is too long"))]
    pub name: Option<String>,
}

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_session))
        .routes(routes!(login))
        .routes(routes!(register))
        .routes(routes!(logout))
}

/// Current session
///
/// Returns the shopper signed in with this client's cookie, or no content
/// when browsing anonymously.
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Signed in", body = Session),
        (status = 204, description = "Anonymous")
    ),
    tag = super::SESSION_TAG
)]
async fn get_session(
    State(state): State<AppState>,
    ClientCookie(client): ClientCookie,
) -> impl IntoResponse {
    match state.lock().await.current_session(client) {
        Some(session) => Json(session.clone()).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Sign in
///
/// Sets the client cookie that later requests must send.
#[utoipa::path(
    post,
    path = "/api/session/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = Session),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 401, description = "Email or password incorrect", body = ErrorResponse)
    ),
    tag = super::SESSION_TAG
)]
async fn login(
    State(state): State<AppState>,
    ClientCookie(client): ClientCookie,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(e))).into_response();
    }
    let input = match validate_login(&payload.email, &payload.password) {
        Ok(input) => input,
        Err(errors) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(errors))).into_response();
        }
    };

    let mut shop = state.lock().await;
    match shop.sign_in(client, &input.email, &input.password).await {
        Ok((client, session)) => {
            ([(header::SET_COOKIE, client_cookie(client))], Json(session)).into_response()
        }
        Err(e @ AuthError::InvalidCredentials) => {
            (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(e.to_string()))).into_response()
        }
        Err(e) => {
            error!("Login failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Login failed")),
            )
                .into_response()
        }
    }
}

/// Register
///
/// Creates the account, signs it in and sets the client cookie.
#[utoipa::path(
    post,
    path = "/api/session/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = Session),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Credentials could not be saved", body = ErrorResponse)
    ),
    tag = super::SESSION_TAG
)]
async fn register(
    State(state): State<AppState>,
    ClientCookie(client): ClientCookie,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(e))).into_response();
    }
    let input = match validate_registration(
        &payload.email,
        &payload.password,
        payload.name.as_deref(),
    ) {
        Ok(input) => input,
        Err(errors) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(errors))).into_response();
        }
    };

    let mut shop = state.lock().await;
    match shop
        .register(client, &input.email, &input.password, input.name.as_deref())
        .await
    {
        Ok((client, session)) => (
            StatusCode::CREATED,
            [(header::SET_COOKIE, client_cookie(client))],
            Json(session),
        )
            .into_response(),
        Err(e @ AuthError::AlreadyExists) => {
            (StatusCode::CONFLICT, Json(ErrorResponse::new(e.to_string()))).into_response()
        }
        Err(e) => {
            error!("Registration failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Could not save the account")),
            )
                .into_response()
        }
    }
}

/// Sign out
///
/// Always succeeds, even when this client is not signed in. Other clients
/// keep their sessions.
#[utoipa::path(
    post,
    path = "/api/session/logout",
    responses(
        (status = 204, description = "Signed out")
    ),
    tag = super::SESSION_TAG
)]
async fn logout(
    State(state): State<AppState>,
    ClientCookie(client): ClientCookie,
) -> impl IntoResponse {
    state.lock().await.sign_out(client);
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_client_cookie())],
    )
}
