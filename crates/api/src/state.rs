use std::sync::Arc;
use std::time::Duration;

use shopfloor_core::model_cache::ModelNameCache;
use shopfloor_shopify::ShopifyApi;
use tokio::sync::RwLock;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: shopfloor_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing platform events.
    pub event_bus: Arc<shopfloor_events::EventBus>,
    /// Storefront client. `None` when the shop is not configured.
    pub shopify: Option<ShopifyApi>,
    /// Headphone model names used by the classifier, cached from settings.
    pub model_cache: Arc<RwLock<ModelNameCache>>,
}

impl AppState {
    /// Build the shared state. Storefront calls use the server's request
    /// timeout.
    ///
    /// # Panics
    ///
    /// Panics if the storefront HTTP client cannot be built (no usable TLS
    /// backend). Called once at startup.
    pub fn new(
        pool: shopfloor_db::DbPool,
        config: Arc<ServerConfig>,
        event_bus: Arc<shopfloor_events::EventBus>,
    ) -> Self {
        let shopify = config.shopify.as_ref().map(|shop| {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .expect("Failed to build storefront HTTP client");
            ShopifyApi::with_client(client, shop.api_url(), shop.access_token.clone())
        });
        let model_cache = ModelNameCache::new(Duration::from_secs(config.model_cache_ttl_secs));

        Self {
            pool,
            config,
            event_bus,
            shopify,
            model_cache: Arc::new(RwLock::new(model_cache)),
        }
    }

    /// The storefront client, or 400 when the shop is not configured.
    pub fn shopify(&self) -> Result<&ShopifyApi, crate::error::AppError> {
        self.shopify.as_ref().ok_or_else(|| {
            crate::error::AppError::BadRequest(
                "Storefront is not configured (set SHOPIFY_SHOP_DOMAIN and SHOPIFY_ACCESS_TOKEN)"
                    .to_string(),
            )
        })
    }
}
