use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::catalog::{Product, ProductId};
use crate::user::Session;

/// Days between confirmation and the promised delivery
pub const DELIVERY_DAYS: u64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PurchaseReceipt {
    #[schema(value_type = String, format = Uuid)]
    pub reference: Uuid,
    #[schema(value_type = u32)]
    pub product_id: ProductId,
    pub title: String,
    pub price: f64,
    pub buyer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_name: Option<String>,
    pub confirmed_at: DateTime<Utc>,
    pub estimated_delivery: NaiveDate,
}

impl PurchaseReceipt {
    #[must_use]
    pub fn thank_you_message(&self) -> String {
        let buyer = self.buyer_name.as_deref().unwrap_or(&self.buyer_email);
        format!("Thanks {buyer}! Your purchase has been made, it will arrive in two days.")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOutcome {
    /// Nobody is signed in; the caller must send the shopper to sign-in
    SignInRequired,
    Confirmed(PurchaseReceipt),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("Product {0} does not exist")]
    UnknownProduct(ProductId),
    #[error("{0} is out of stock")]
    OutOfStock(String),
}

/// Question shown before a signed-in shopper commits to a purchase
#[must_use]
pub fn confirmation_prompt(product: &Product) -> String {
    format!("Buy {} for ${}?", product.title, product.price)
}

/// Simulated checkout. Never touches the catalog or the session.
/// # Errors
/// - `PurchaseError::OutOfStock` if the product cannot be bought
pub fn purchase(
    product: &Product,
    session: Option<&Session>,
) -> Result<PurchaseOutcome, PurchaseError> {
    let Some(session) = session else {
        return Ok(PurchaseOutcome::SignInRequired);
    };

    if !product.in_stock {
        return Err(PurchaseError::OutOfStock(product.title.clone()));
    }

    let confirmed_at = Utc::now();
    let estimated_delivery = confirmed_at
        .date_naive()
        .checked_add_days(Days::new(DELIVERY_DAYS))
        .unwrap_or(NaiveDate::MAX);
    let receipt = PurchaseReceipt {
        reference: Uuid::new_v4(),
        product_id: product.id,
        title: product.title.clone(),
        price: product.price,
        buyer_email: session.email.clone(),
        buyer_name: session.name.clone(),
        confirmed_at,
        estimated_delivery,
    };

    info!(
        "Purchase {} confirmed: {} for ${} by {}",
        receipt.reference, receipt.title, receipt.price, receipt.buyer_email
    );
    Ok(PurchaseOutcome::Confirmed(receipt))
}
