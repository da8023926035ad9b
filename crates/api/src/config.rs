use shopfloor_shopify::DEFAULT_API_VERSION;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Seconds to wait for background tasks after the listener stops (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT validation settings.
    pub jwt: JwtConfig,
    /// Storefront connection. `None` when the shop is not configured; sync
    /// endpoints then answer 400.
    pub shopify: Option<ShopifyConfig>,
    /// Lifetime of the cached headphone model list (default: `300`).
    pub model_cache_ttl_secs: u64,
}

/// Storefront Admin API credentials.
#[derive(Clone)]
pub struct ShopifyConfig {
    pub shop_domain: String,
    pub access_token: String,
    pub api_version: String,
    /// Full base URL override, e.g. a local proxy. Takes precedence over
    /// `shop_domain` + `api_version`.
    pub api_url: Option<String>,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("shop_domain", &self.shop_domain)
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:3001`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `MODEL_CACHE_TTL_SECS`  | `300`                      |
    /// | `SHOPIFY_SHOP_DOMAIN`   | unset (sync disabled)      |
    /// | `SHOPIFY_ACCESS_TOKEN`  | unset (sync disabled)      |
    /// | `SHOPIFY_API_VERSION`   | `2024-01`                  |
    /// | `SHOPIFY_API_URL`       | derived from shop domain   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3001".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let model_cache_ttl_secs: u64 = std::env::var("MODEL_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("MODEL_CACHE_TTL_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();
        let shopify = ShopifyConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            shopify,
            model_cache_ttl_secs,
        }
    }
}

impl ShopifyConfig {
    /// Read storefront credentials. Both the shop domain and the access
    /// token must be set and non-empty, otherwise the storefront is treated
    /// as unconfigured.
    pub fn from_env() -> Option<Self> {
        let non_empty = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let shop_domain = non_empty("SHOPIFY_SHOP_DOMAIN")?;
        let access_token = non_empty("SHOPIFY_ACCESS_TOKEN")?;
        let api_version =
            non_empty("SHOPIFY_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        Some(Self {
            shop_domain,
            access_token,
            api_version,
            api_url: non_empty("SHOPIFY_API_URL"),
        })
    }

    /// Base URL of the Admin REST API.
    pub fn api_url(&self) -> String {
        match &self.api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let domain = self
                    .shop_domain
                    .trim_start_matches("https://")
                    .trim_end_matches('/');
                format!("https://{domain}/admin/api/{}", self.api_version)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop(api_url: Option<&str>) -> ShopifyConfig {
        ShopifyConfig {
            shop_domain: "https://acme.myshopify.com/".to_string(),
            access_token: "shpat_secret".to_string(),
            api_version: "2024-01".to_string(),
            api_url: api_url.map(str::to_string),
        }
    }

    #[test]
    fn api_url_is_built_from_domain() {
        assert_eq!(
            shop(None).api_url(),
            "https://acme.myshopify.com/admin/api/2024-01"
        );
    }

    #[test]
    fn api_url_override_wins() {
        assert_eq!(
            shop(Some("http://127.0.0.1:9000/admin/")).api_url(),
            "http://127.0.0.1:9000/admin"
        );
    }

    #[test]
    fn debug_hides_token() {
        let rendered = format!("{:?}", shop(None));
        assert!(!rendered.contains("shpat_secret"));
    }
}
