pub mod client;

use domain::catalog::{ALL_BRANDS, FilterState, PriceBucket};
use domain::core::Storefront;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Cheaply clonable handle to the storefront this process serves.
/// Requests from every client are serialised through the lock, so a login or
/// registration is never interleaved with another.
#[derive(Clone)]
pub struct StorefrontHandle {
    inner: Arc<Mutex<Storefront>>,
}

impl StorefrontHandle {
    pub fn new(storefront: Storefront) -> Self {
        Self {
            inner: Arc::new(Mutex::new(storefront)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Storefront> {
        self.inner.lock().await
    }
}

/// Build a filter from raw query parameters; an unrecognised brand or price
/// means "All". The text query is kept exactly as typed.
pub fn filter_from_params(
    brand: Option<&str>,
    price: Option<&str>,
    query: Option<&str>,
) -> FilterState {
    let brand = brand
        .map(str::trim)
        .filter(|brand| !brand.is_empty())
        .unwrap_or(ALL_BRANDS);
    let price_bucket = price
        .filter(|price| !price.trim().is_empty())
        .map_or(PriceBucket::All, |price| {
            price.parse().unwrap_or_else(|e| {
                debug!("Ignoring price filter: {e}");
                PriceBucket::All
            })
        });

    FilterState {
        brand: brand.to_string(),
        price_bucket,
        query: query.unwrap_or_default().to_string(),
    }
}
