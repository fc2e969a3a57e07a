use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use domain::core::ClientId;

/// Cookie carrying the id the storefront issued at sign-in
pub const COOKIE_NAME: &str = "storefront_client";

/// The caller's client id, if it sent one that parses.
///
/// Whether the id still has a session is up to the `Storefront`; unknown ids
/// simply browse anonymously.
#[derive(Debug, Clone, Copy)]
pub struct ClientCookie(pub Option<ClientId>);

impl<S> FromRequestParts<S> for ClientCookie
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(client_from_headers(&parts.headers)))
    }
}

fn client_from_headers(headers: &HeaderMap) -> Option<ClientId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            cookie
                .trim()
                .strip_prefix(COOKIE_NAME)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .and_then(|id| id.parse().ok())
}

/// `Set-Cookie` value binding the browser to `client`
pub fn client_cookie(client: ClientId) -> String {
    format!("{COOKIE_NAME}={client}; HttpOnly; SameSite=Strict; Path=/")
}

/// `Set-Cookie` value that drops the client id
pub fn clear_client_cookie() -> String {
    format!("{COOKIE_NAME}=; HttpOnly; SameSite=Strict; Max-Age=0; Path=/")
}
