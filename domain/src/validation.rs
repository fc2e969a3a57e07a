use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// Loose shape check used by the sign-in form
    static ref LOGIN_EMAIL: Regex = Regex::new(r"\S+@\S+\.\S+").expect("valid regex");
    /// Stricter check used by the contact form: no whitespace or extra `@`
    static ref CONTACT_EMAIL: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex");
}

/// A problem with one form field, shown next to that field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

/// Field errors in the order the form declares its fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", .errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct FormErrors {
    errors: Vec<ValidationError>,
}

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Message for `field`, if it failed
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    /// The field a form should focus after a failed submit
    #[must_use]
    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// `Ok(value)` when no error was recorded
    /// # Errors
    /// Returns `self` if any field failed
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

#[must_use]
pub fn is_valid_login_email(email: &str) -> bool {
    LOGIN_EMAIL.is_match(email)
}

#[must_use]
pub fn is_valid_contact_email(email: &str) -> bool {
    CONTACT_EMAIL.is_match(email)
}

/// At least seven digits once every other character is dropped
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    phone.chars().filter(char::is_ascii_digit).count() >= 7
}

/// Sign-in input after trimming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Registration input after trimming; a blank name becomes `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationInput {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// # Errors
/// Returns a single form-level error, checked in order: missing fields, then email shape
pub fn validate_login(email: &str, password: &str) -> Result<LoginInput, FormErrors> {
    let mut errors = FormErrors::new();
    let email = email.trim();

    if email.is_empty() || password.is_empty() {
        errors.add("form", "Please enter both email and password.");
    } else if !is_valid_login_email(email) {
        errors.add("email", "Please enter a valid email address.");
    }

    errors.into_result(LoginInput {
        email: email.to_string(),
        password: password.to_string(),
    })
}

/// # Errors
/// Returns a form-level error when email or password is missing
pub fn validate_registration(
    email: &str,
    password: &str,
    name: Option<&str>,
) -> Result<RegistrationInput, FormErrors> {
    let mut errors = FormErrors::new();
    let email = email.trim();

    if email.is_empty() || password.is_empty() {
        errors.add("form", "Email and password required");
    }

    errors.into_result(RegistrationInput {
        email: email.to_string(),
        password: password.to_string(),
        name: name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from),
    })
}
