//! Read-only client for the storefront Admin REST API.
//!
//! Only `GET` endpoints are wrapped: the shop floor never writes back to the
//! storefront.

pub mod api;
pub mod models;

pub use api::{ShopifyApi, ShopifyApiError, DEFAULT_API_VERSION};
