//! Route definitions for storefront sync and order import.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::shopify;
use crate::state::AppState;

/// Routes mounted at `/shopify`.
///
/// ```text
/// POST   /sync        -> sync_orders (?limit)
/// GET    /products    -> list_products (?limit)
/// POST   /import      -> import_items
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sync", post(shopify::sync_orders))
        .route("/products", get(shopify::list_products))
        .route("/import", post(shopify::import_items))
}
