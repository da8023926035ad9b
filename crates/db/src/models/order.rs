//! Order and order item models.
//!
//! Both tables are keyed by storefront ids as well as their own primary keys;
//! sync upserts on the storefront id.

use serde::{Deserialize, Serialize};
use shopfloor_core::types::{DbId, Timestamp};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A row from the `orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub shopify_order_id: i64,
    pub order_number: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub total_price: Option<f64>,
    pub financial_status: Option<String>,
    pub fulfillment_status: Option<String>,
    pub ordered_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `order_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: DbId,
    pub order_id: DbId,
    pub shopify_line_item_id: i64,
    pub title: String,
    pub variant_title: Option<String>,
    pub sku: Option<String>,
    pub quantity: i32,
    pub price: Option<f64>,
    pub properties: serde_json::Value,
    pub product_category: String,
    pub specs: serde_json::Value,
    pub imported_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An order with its line items, as returned by `GET /orders/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// ---------------------------------------------------------------------------
// Upsert DTOs (internal, built from storefront payloads)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertOrder {
    pub shopify_order_id: i64,
    pub order_number: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub total_price: Option<f64>,
    pub financial_status: Option<String>,
    pub fulfillment_status: Option<String>,
    pub ordered_at: Option<Timestamp>,
}

/// Line item data plus the classification derived at sync time.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertOrderItem {
    pub shopify_line_item_id: i64,
    pub title: String,
    pub variant_title: Option<String>,
    pub sku: Option<String>,
    pub quantity: i32,
    pub price: Option<f64>,
    pub properties: serde_json::Value,
    pub product_category: String,
    pub specs: serde_json::Value,
}
