//! Storefront payload shapes.
//!
//! Only the fields the shop floor reads are declared; everything else in the
//! Admin API payload is ignored. Money amounts arrive as decimal strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopfloor_core::specs::LineItemProperty;

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersEnvelope {
    pub orders: Vec<ShopifyOrder>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsEnvelope {
    pub products: Vec<ShopifyProduct>,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyOrder {
    pub id: i64,
    /// Display name such as `"#1001"`.
    pub name: String,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub total_price: Option<String>,
    pub financial_status: Option<String>,
    pub fulfillment_status: Option<String>,
    pub customer: Option<ShopifyCustomer>,
    #[serde(default)]
    pub line_items: Vec<ShopifyLineItem>,
}

impl ShopifyOrder {
    /// Customer's full name, if any part of it is present.
    pub fn customer_name(&self) -> Option<String> {
        let customer = self.customer.as_ref()?;
        let parts: Vec<&str> = [customer.first_name.as_deref(), customer.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    /// Order email, falling back to the customer's email.
    pub fn contact_email(&self) -> Option<String> {
        self.email
            .clone()
            .filter(|e| !e.is_empty())
            .or_else(|| self.customer.as_ref().and_then(|c| c.email.clone()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyCustomer {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyLineItem {
    pub id: i64,
    pub title: String,
    pub variant_title: Option<String>,
    pub sku: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub price: Option<String>,
    #[serde(default)]
    pub properties: Vec<ShopifyProperty>,
}

fn default_quantity() -> i32 {
    1
}

impl ShopifyLineItem {
    /// Properties as name/value text pairs.
    pub fn text_properties(&self) -> Vec<LineItemProperty> {
        self.properties
            .iter()
            .map(|p| LineItemProperty {
                name: p.name.clone(),
                value: match &p.value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                },
            })
            .collect()
    }
}

/// A checkout property. Values are usually strings but may be any JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyProperty {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyProduct {
    pub id: i64,
    pub title: String,
    pub product_type: Option<String>,
    pub vendor: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub variants: Vec<ShopifyVariant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyVariant {
    pub id: i64,
    pub title: String,
    pub price: Option<String>,
    pub sku: Option<String>,
}
