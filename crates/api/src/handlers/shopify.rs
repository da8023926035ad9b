//! Storefront sync and order-item import.
//!
//! Sync pulls recent orders (read-only) and upserts them with a
//! classification and spec sheet per line item. Import turns selected order
//! items into work tasks; it runs item by item and stops at the first
//! failure, keeping what was already imported.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shopfloor_core::classification::{classify_product, parse_price};
use shopfloor_core::error::CoreError;
use shopfloor_core::specs::{parse_line_item_specs, LineItemSpecs};
use shopfloor_core::tasks::derive_required_tasks;
use shopfloor_core::types::DbId;
use shopfloor_db::models::order::{UpsertOrder, UpsertOrderItem};
use shopfloor_db::repositories::{OrderRepo, WorkTaskRepo};
use shopfloor_events::{names, PlatformEvent};
use shopfloor_shopify::api::MAX_PAGE_SIZE;
use shopfloor_shopify::models::{ShopifyLineItem, ShopifyOrder};

use crate::error::{AppError, AppResult};
use crate::handlers::settings::headphone_models;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireSupervisor;
use crate::response::DataResponse;
use crate::state::AppState;

/// Orders or products fetched per sync when `?limit` is absent.
const DEFAULT_FETCH_LIMIT: u32 = 50;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct FetchParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SyncSummary {
    pub orders_synced: usize,
    pub items_synced: usize,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub order_item_ids: Vec<DbId>,
}

/// Outcome of an import run. When `error` is set, `failed_item_id` names
/// the item the run stopped at; items before it stay imported.
#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub imported_items: usize,
    pub skipped_items: usize,
    pub created_tasks: usize,
    pub error: Option<String>,
    pub failed_item_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

fn fetch_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_FETCH_LIMIT).clamp(1, MAX_PAGE_SIZE)
}

fn to_upsert_order(order: &ShopifyOrder) -> UpsertOrder {
    UpsertOrder {
        shopify_order_id: order.id,
        order_number: order.name.clone(),
        customer_name: order.customer_name(),
        customer_email: order.contact_email(),
        total_price: order.total_price.as_deref().and_then(parse_price),
        financial_status: order.financial_status.clone(),
        fulfillment_status: order.fulfillment_status.clone(),
        ordered_at: order.created_at,
    }
}

/// Classify a line item and derive its spec sheet.
fn to_upsert_item(item: &ShopifyLineItem, models: &[String]) -> UpsertOrderItem {
    let price = item.price.as_deref().and_then(parse_price);
    let category = classify_product(&item.title, item.variant_title.as_deref(), price, models);
    let properties = item.text_properties();
    let specs = parse_line_item_specs(item.variant_title.as_deref(), &properties, category);

    UpsertOrderItem {
        shopify_line_item_id: item.id,
        title: item.title.clone(),
        variant_title: item.variant_title.clone(),
        sku: item.sku.clone(),
        quantity: item.quantity,
        price,
        properties: serde_json::to_value(&properties).unwrap_or_else(|_| json!([])),
        product_category: category.as_str().to_string(),
        specs: serde_json::to_value(&specs).unwrap_or_else(|_| json!({})),
    }
}

// ---------------------------------------------------------------------------
// POST /shopify/sync
// ---------------------------------------------------------------------------

/// Fetch recent orders and upsert them. Line items already stored keep the
/// classification they were given on first sync.
pub async fn sync_orders(
    RequireSupervisor(user): RequireSupervisor,
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> AppResult<impl IntoResponse> {
    let client = state.shopify()?;
    let orders = client.list_orders(fetch_limit(params.limit)).await?;
    let models = headphone_models(&state).await;

    let mut summary = SyncSummary {
        orders_synced: 0,
        items_synced: 0,
    };
    for order in &orders {
        let items: Vec<UpsertOrderItem> = order
            .line_items
            .iter()
            .map(|item| to_upsert_item(item, &models))
            .collect();
        let (_, stored) =
            OrderRepo::upsert_with_items(&state.pool, &to_upsert_order(order), &items).await?;
        summary.orders_synced += 1;
        summary.items_synced += stored.len();
    }

    tracing::info!(
        orders = summary.orders_synced,
        items = summary.items_synced,
        actor = %user.subject,
        "Storefront orders synced",
    );

    state.event_bus.publish(
        PlatformEvent::new(names::ORDER_SYNCED)
            .with_actor(user.subject.as_str())
            .with_payload(json!({
                "orders_synced": summary.orders_synced,
                "items_synced": summary.items_synced,
            })),
    );

    Ok(Json(DataResponse { data: summary }))
}

// ---------------------------------------------------------------------------
// GET /shopify/products
// ---------------------------------------------------------------------------

pub async fn list_products(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> AppResult<impl IntoResponse> {
    let products = state
        .shopify()?
        .list_products(fetch_limit(params.limit))
        .await?;
    Ok(Json(DataResponse { data: products }))
}

// ---------------------------------------------------------------------------
// POST /shopify/import
// ---------------------------------------------------------------------------

async fn import_one(state: &AppState, item_id: DbId, actor: &str) -> AppResult<Option<usize>> {
    let item = OrderRepo::find_item(&state.pool, item_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "OrderItem",
            id: item_id,
        }))?;

    let has_custom_work = serde_json::from_value::<LineItemSpecs>(item.specs.clone())
        .map(|specs| specs.requires_custom_work)
        .unwrap_or(false);
    let task_types = derive_required_tasks(&item.product_category, has_custom_work);

    let Some(tasks) = WorkTaskRepo::import_item(&state.pool, item_id, &task_types).await? else {
        return Ok(None);
    };

    state.event_bus.publish(
        PlatformEvent::new(names::ORDER_ITEM_IMPORTED)
            .with_source("order_item", item_id)
            .with_actor(actor)
            .with_payload(json!({
                "order_item_id": item_id,
                "product_category": item.product_category,
                "task_ids": tasks.iter().map(|t| t.id).collect::<Vec<_>>(),
            })),
    );
    Ok(Some(tasks.len()))
}

/// Create work tasks for each selected item, in request order. Items that
/// were imported before are skipped. The first failure ends the run; the
/// summary reports it alongside the counts reached so far.
pub async fn import_items(
    RequireSupervisor(user): RequireSupervisor,
    State(state): State<AppState>,
    Json(input): Json<ImportRequest>,
) -> AppResult<impl IntoResponse> {
    if input.order_item_ids.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "order_item_ids must not be empty".to_string(),
        )));
    }

    let mut summary = ImportSummary::default();
    for &item_id in &input.order_item_ids {
        match import_one(&state, item_id, &user.subject).await {
            Ok(Some(created)) => {
                summary.imported_items += 1;
                summary.created_tasks += created;
            }
            Ok(None) => summary.skipped_items += 1,
            Err(e) => {
                tracing::warn!(order_item_id = item_id, error = %e, "Import stopped");
                summary.error = Some(e.to_string());
                summary.failed_item_id = Some(item_id);
                break;
            }
        }
    }

    tracing::info!(
        imported = summary.imported_items,
        skipped = summary.skipped_items,
        tasks = summary.created_tasks,
        actor = %user.subject,
        "Order items imported",
    );

    Ok(Json(DataResponse { data: summary }))
}
