use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use domain::catalog::{Product, ProductId};
use domain::purchase::{PurchaseError, PurchaseOutcome, PurchaseReceipt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::{AppState, ErrorResponse};
use crate::services::{client::ClientCookie, filter_from_params};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    /// Brand name, or "All"
    pub brand: Option<String>,
    /// One of `under-300`, `300-600`, `above-600`, or "All"
    pub price: Option<String>,
    /// Case-insensitive text matched against title and description
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseResponse {
    pub receipt: PurchaseReceipt,
    pub message: String,
}

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_products))
        .routes(routes!(list_brands))
        .routes(routes!(purchase_product))
}

/// List products
///
/// Products in catalog order, narrowed by the optional brand, price bucket
/// and text filters.
#[utoipa::path(
    get,
    path = "/api/catalog",
    params(CatalogQuery),
    responses(
        (status = 200, description = "Matching products", body = Vec<Product>)
    ),
    tag = super::CATALOG_TAG
)]
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let filter = filter_from_params(
        query.brand.as_deref(),
        query.price.as_deref(),
        query.q.as_deref(),
    );
    let shop = state.lock().await;
    let products: Vec<Product> = shop.catalog.filter(&filter).into_iter().cloned().collect();
    debug!("Catalog filter {filter:?} matched {} products", products.len());

    Json(products)
}

/// List brands
///
/// "All" followed by each distinct brand in first-appearance order.
#[utoipa::path(
    get,
    path = "/api/catalog/brands",
    responses(
        (status = 200, description = "Brand filter options", body = Vec<String>)
    ),
    tag = super::CATALOG_TAG
)]
async fn list_brands(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.lock().await.catalog.brands())
}

/// Buy a product
///
/// Requires the client cookie of a signed-in session. The checkout is simulated: nothing is
/// charged and stock is unchanged.
#[utoipa::path(
    post,
    path = "/api/catalog/{product_id}/purchase",
    params(
        ("product_id" = u32, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Purchase confirmed", body = PurchaseResponse),
        (status = 401, description = "Sign-in required", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 409, description = "Product out of stock", body = ErrorResponse)
    ),
    tag = super::CATALOG_TAG
)]
async fn purchase_product(
    State(state): State<AppState>,
    ClientCookie(client): ClientCookie,
    Path(product_id): Path<ProductId>,
) -> impl IntoResponse {
    let shop = state.lock().await;
    match shop.purchase(client, product_id) {
        Ok(PurchaseOutcome::Confirmed(receipt)) => {
            info!("Purchase {} confirmed", receipt.reference);
            let message = receipt.thank_you_message();
            Json(PurchaseResponse { receipt, message }).into_response()
        }
        Ok(PurchaseOutcome::SignInRequired) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Sign in to buy this product")),
        )
            .into_response(),
        Err(e @ PurchaseError::UnknownProduct(_)) => {
            (StatusCode::NOT_FOUND, Json(ErrorResponse::new(e.to_string()))).into_response()
        }
        Err(e @ PurchaseError::OutOfStock(_)) => {
            (StatusCode::CONFLICT, Json(ErrorResponse::new(e.to_string()))).into_response()
        }
    }
}
