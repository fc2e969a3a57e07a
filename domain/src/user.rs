use database_adapter::DbError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// A registered shopper, exactly as written to the durable slot.
///
/// Passwords are kept in plaintext: the storefront authentication is a mock
/// and must not be reused for real accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Credential {
    #[must_use]
    pub fn new(email: String, password: String, name: Option<String>) -> Self {
        Self {
            email,
            password,
            name,
        }
    }

    /// The account every fresh or unreadable store falls back to
    #[must_use]
    pub fn demo() -> Self {
        Self::new(
            String::from("sueirodaniel04@gmail.com"),
            String::from("12345678"),
            Some(String::from("Daniel Sueiro")),
        )
    }

    #[must_use]
    pub fn has_email(&self, email: &str) -> bool {
        self.email.to_lowercase() == email.to_lowercase()
    }

    #[must_use]
    pub fn verify_password(&self, password: &str) -> bool {
        self.password == password
    }
}

/// The identity currently signed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Session {
    /// Name when known, email otherwise
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

impl From<&Credential> for Session {
    fn from(credential: &Credential) -> Self {
        Self {
            email: credential.email.clone(),
            name: credential.name.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("A user with this email already exists")]
    AlreadyExists,
    /// Unknown email and wrong password are deliberately the same error
    #[error("Email or password incorrect.")]
    InvalidCredentials,
    #[error("Could not save credentials: {0}")]
    Storage(#[from] DbError),
    #[error("Could not encode credentials: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub trait CredentialsExt {
    /// Finds the record whose email matches case-insensitively
    fn find_by_email(&self, email: &str) -> Option<&Credential>;

    /// Checks if an email is already registered
    fn email_exists(&self, email: &str) -> bool {
        self.find_by_email(email).is_some()
    }

    /// First-factor check: case-insensitive email, exact password
    fn authenticate(&self, email: &str, password: &str) -> Result<&Credential, AuthError>;
}

impl CredentialsExt for [Credential] {
    fn find_by_email(&self, email: &str) -> Option<&Credential> {
        self.iter().find(|credential| credential.has_email(email))
    }

    fn authenticate(&self, email: &str, password: &str) -> Result<&Credential, AuthError> {
        self.iter()
            .find(|credential| credential.has_email(email) && credential.verify_password(password))
            .ok_or(AuthError::InvalidCredentials)
    }
}
