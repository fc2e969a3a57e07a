use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::validation::{FormErrors, is_valid_contact_email, is_valid_phone};

/// Reason for contacting the shop; decides which extra field is required
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ContactSubject {
    #[default]
    #[serde(rename = "Product availability")]
    ProductAvailability,
    #[serde(rename = "Repair / Service")]
    RepairService,
    #[serde(rename = "Order / Shipping")]
    OrderShipping,
    Warranty,
    Other,
}

impl ContactSubject {
    pub const ALL: [ContactSubject; 5] = [
        ContactSubject::ProductAvailability,
        ContactSubject::RepairService,
        ContactSubject::OrderShipping,
        ContactSubject::Warranty,
        ContactSubject::Other,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ContactSubject::ProductAvailability => "Product availability",
            ContactSubject::RepairService => "Repair / Service",
            ContactSubject::OrderShipping => "Order / Shipping",
            ContactSubject::Warranty => "Warranty",
            ContactSubject::Other => "Other",
        }
    }

    #[must_use]
    pub fn needs_order_number(self) -> bool {
        matches!(self, ContactSubject::OrderShipping | ContactSubject::Warranty)
    }

    #[must_use]
    pub fn needs_phone(self) -> bool {
        self == ContactSubject::RepairService
    }

    #[must_use]
    pub fn needs_product_model(self) -> bool {
        self == ContactSubject::ProductAvailability
    }
}

impl fmt::Display for ContactSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown contact subject: {0}")]
pub struct UnknownSubject(pub String);

impl FromStr for ContactSubject {
    type Err = UnknownSubject;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContactSubject::ALL
            .into_iter()
            .find(|subject| subject.label() == s)
            .ok_or_else(|| UnknownSubject(s.to_string()))
    }
}

/// Contact form fields exactly as typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub order_number: String,
    pub phone: String,
    pub product_model: String,
}

/// A contact request that passed validation, with the optional details its
/// subject calls for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: ContactSubject,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_model: Option<String>,
}

impl ContactForm {
    /// # Errors
    /// Returns every failing field, in form order
    pub fn validate(&self) -> Result<ContactRequest, FormErrors> {
        let mut errors = FormErrors::new();

        let name = self.name.trim();
        if name.chars().count() < 2 {
            errors.add("name", "Please enter your name (at least 2 characters).");
        }

        let email = self.email.trim();
        if !is_valid_contact_email(email) {
            errors.add("email", "Please enter a valid email address.");
        }

        let subject = self.subject.parse::<ContactSubject>().ok();
        if subject.is_none() {
            errors.add("subject", "Please choose a valid reason.");
        }

        let message = self.message.trim();
        if message.chars().count() < 10 {
            errors.add(
                "message",
                "Please provide a more detailed message (at least 10 characters).",
            );
        }

        let order_number = self.order_number.trim();
        let phone = self.phone.trim();
        let product_model = self.product_model.trim();
        if let Some(subject) = subject {
            if subject.needs_order_number() && order_number.chars().count() < 4 {
                errors.add(
                    "order_number",
                    "Please provide your order number (at least 4 characters).",
                );
            }
            if subject.needs_phone() && !is_valid_phone(phone) {
                errors.add(
                    "phone",
                    "Please enter a valid phone number so we can contact you about repairs.",
                );
            }
            if subject.needs_product_model() && product_model.chars().count() < 2 {
                errors.add(
                    "product_model",
                    "Please specify the product model you are asking about.",
                );
            }
        }

        let Some(subject) = subject else {
            return Err(errors);
        };
        let detail = |needed: bool, value: &str| (needed && !value.is_empty()).then(|| value.to_string());

        errors.into_result(ContactRequest {
            name: name.to_string(),
            email: email.to_string(),
            subject,
            message: message.to_string(),
            order_number: detail(subject.needs_order_number(), order_number),
            phone: detail(subject.needs_phone(), phone),
            product_model: detail(subject.needs_product_model(), product_model),
        })
    }
}
