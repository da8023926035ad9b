#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

use shopfloor_api::auth::jwt::{Claims, JwtConfig};
use shopfloor_api::config::{ServerConfig, ShopifyConfig};
use shopfloor_api::router::build_app_router;
use shopfloor_api::state::AppState;
use shopfloor_core::types::DbId;
use shopfloor_db::models::order::{UpsertOrder, UpsertOrderItem};
use shopfloor_db::repositories::OrderRepo;
use shopfloor_events::EventBus;

const TEST_SECRET: &str = "integration-test-secret-long-enough";

/// Build a test `ServerConfig` with safe defaults and no storefront.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3001".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
        shopify: None,
        model_cache_ttl_secs: 300,
    }
}

/// Config pointing the storefront client at `api_url`.
pub fn test_config_with_shop(api_url: &str) -> ServerConfig {
    ServerConfig {
        shopify: Some(ShopifyConfig {
            shop_domain: "test-shop.myshopify.com".to_string(),
            access_token: "shpat_test".to_string(),
            api_version: "2024-01".to_string(),
            api_url: Some(api_url.to_string()),
        }),
        ..test_config()
    }
}

pub fn build_test_state(pool: PgPool, config: ServerConfig) -> AppState {
    AppState::new(pool, Arc::new(config), Arc::new(EventBus::default()))
}

/// Build the full application router, mirroring `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    build_app_router(build_test_state(pool, config.clone()), &config)
}

pub fn app_from_state(state: AppState) -> Router {
    let config = state.config.as_ref().clone();
    build_app_router(state, &config)
}

/// A valid bearer token for `role`.
pub fn token(role: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: format!("test-{role}"),
        role: role.to_string(),
        exp: now + 900,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("encoding should succeed")
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    role: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(role) = role {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token(role)));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// GET as a manager.
pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, Some("manager"), None).await
}

pub async fn get_as(app: Router, uri: &str, role: &str) -> Response {
    send(app, Method::GET, uri, Some(role), None).await
}

/// POST JSON as a manager.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some("manager"), Some(body)).await
}

pub async fn post_json_as(app: Router, uri: &str, role: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(role), Some(body)).await
}

/// PUT JSON as a manager.
pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some("manager"), Some(body)).await
}

pub async fn put_json_as(app: Router, uri: &str, role: &str, body: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some(role), Some(body)).await
}

/// DELETE as a manager.
pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, Some("manager"), None).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `data` field of a success response.
pub async fn data(response: Response) -> serde_json::Value {
    let mut json = body_json(response).await;
    json["data"].take()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert an order with one item per `(title, category)` and return the
/// item ids in order.
pub async fn seed_order(pool: &PgPool, shopify_order_id: i64, items: &[(&str, &str)]) -> Vec<DbId> {
    let order = UpsertOrder {
        shopify_order_id,
        order_number: format!("#{shopify_order_id}"),
        customer_name: Some("Test Customer".to_string()),
        customer_email: Some("customer@example.com".to_string()),
        total_price: Some(100.0),
        financial_status: Some("paid".to_string()),
        fulfillment_status: None,
        ordered_at: None,
    };
    let items: Vec<UpsertOrderItem> = items
        .iter()
        .enumerate()
        .map(|(idx, (title, category))| UpsertOrderItem {
            shopify_line_item_id: shopify_order_id * 100 + idx as i64,
            title: title.to_string(),
            variant_title: None,
            sku: None,
            quantity: 1,
            price: Some(100.0),
            properties: json!([]),
            product_category: category.to_string(),
            specs: json!({}),
        })
        .collect();
    let (_, stored) = OrderRepo::upsert_with_items(pool, &order, &items)
        .await
        .expect("order seed should succeed");
    stored.into_iter().map(|item| item.id).collect()
}

/// A two-stage template body: `sanding` then `assembly`.
pub fn template_body(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "stages": [
            {"id": "s1", "stage_code": "sanding", "name": "Sanding", "estimated_hours": 2.0},
            {"id": "s2", "stage_code": "assembly", "name": "Assembly", "estimated_hours": 3.0}
        ]
    })
}

/// Create a template via the API and return its id.
pub async fn create_template(pool: &PgPool, body: serde_json::Value) -> DbId {
    let response = post_json(build_test_app(pool.clone()), "/api/v1/workflows", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    data(response).await["id"].as_i64().unwrap()
}

/// Create a batch via the API and return its JSON.
pub async fn create_batch(
    pool: &PgPool,
    template_id: Option<DbId>,
    item_ids: &[DbId],
) -> serde_json::Value {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/batches",
        json!({
            "name": "Batch A",
            "order_item_ids": item_ids,
            "workflow_template_id": template_id,
        }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    data(response).await
}
