//! REST API client for the storefront Admin endpoints.

use crate::models::{OrdersEnvelope, ProductsEnvelope, ShopifyOrder, ShopifyProduct};

/// Admin API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "2024-01";

/// Header carrying the static Admin API access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Largest page the Admin API returns.
pub const MAX_PAGE_SIZE: u32 = 250;

/// HTTP client for a single shop.
#[derive(Clone)]
pub struct ShopifyApi {
    client: reqwest::Client,
    api_url: String,
    access_token: String,
}

/// Errors from the storefront REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ShopifyApiError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The storefront returned a non-2xx status code.
    #[error("Storefront API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl ShopifyApi {
    /// Create a client for `shop_domain` (e.g. `example.myshopify.com`).
    pub fn new(shop_domain: &str, access_token: String, api_version: &str) -> Self {
        let domain = shop_domain
            .trim()
            .trim_start_matches("https://")
            .trim_end_matches('/');
        Self::with_client(
            reqwest::Client::new(),
            format!("https://{domain}/admin/api/{api_version}"),
            access_token,
        )
    }

    /// Create a client against an explicit base URL, reusing `client`.
    pub fn with_client(client: reqwest::Client, api_url: String, access_token: String) -> Self {
        Self {
            client,
            api_url,
            access_token,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch the most recent orders in any status, newest first.
    ///
    /// Sends `GET /orders.json?status=any&limit={limit}`.
    pub async fn list_orders(&self, limit: u32) -> Result<Vec<ShopifyOrder>, ShopifyApiError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        tracing::debug!(limit, "Fetching storefront orders");
        let envelope: OrdersEnvelope = self
            .get_json(&format!("orders.json?status=any&limit={limit}"))
            .await?;
        Ok(envelope.orders)
    }

    /// Fetch products with their variants.
    ///
    /// Sends `GET /products.json?limit={limit}`.
    pub async fn list_products(&self, limit: u32) -> Result<Vec<ShopifyProduct>, ShopifyApiError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let envelope: ProductsEnvelope = self
            .get_json(&format!("products.json?limit={limit}"))
            .await?;
        Ok(envelope.products)
    }

    // ---- private helpers ----

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ShopifyApiError> {
        let response = self
            .client
            .get(format!("{}/{}", self.api_url, path))
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Return the response unchanged on 2xx, or an [`ShopifyApiError::ApiError`]
    /// with the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ShopifyApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ShopifyApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ShopifyApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

impl std::fmt::Debug for ShopifyApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyApi")
            .field("api_url", &self.api_url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_from_domain() {
        let api = ShopifyApi::new("https://example.myshopify.com/", "t".into(), "2024-01");
        assert_eq!(api.api_url(), "https://example.myshopify.com/admin/api/2024-01");
    }

    #[test]
    fn debug_redacts_token() {
        let api = ShopifyApi::new("example.myshopify.com", "shpat_secret".into(), DEFAULT_API_VERSION);
        let rendered = format!("{api:?}");
        assert!(!rendered.contains("shpat_secret"));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        let api = ShopifyApi::with_client(
            reqwest::Client::new(),
            "http://127.0.0.1:9".to_string(),
            "t".into(),
        );
        let err = api.list_orders(10).await.unwrap_err();
        assert!(matches!(err, ShopifyApiError::Request(_)));
    }
}
