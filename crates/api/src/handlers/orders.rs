//! Handlers for synced orders.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use shopfloor_core::error::CoreError;
use shopfloor_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use shopfloor_core::types::DbId;
use shopfloor_db::models::order::OrderWithItems;
use shopfloor_db::repositories::OrderRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /orders -- newest orders first.
pub async fn list_orders(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(params.offset);
    let orders = OrderRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: orders }))
}

/// GET /orders/{id} -- an order with its line items.
pub async fn get_order(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Order", id }))?;
    let items = OrderRepo::items_for_order(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: OrderWithItems { order, items },
    }))
}
