//! Handlers for production requests and their logs.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use shopfloor_core::error::CoreError;
use shopfloor_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use shopfloor_core::production::{validate_log_quantity, validate_new_request, ProductionRequestStatus};
use shopfloor_core::types::DbId;
use shopfloor_db::models::production::{CreateProductionRequest, LogProduction, ProductionRequest};
use shopfloor_db::repositories::ProductionRepo;
use shopfloor_events::{names, PlatformEvent};

use crate::error::{AppError, AppResult};
use crate::handlers::workers::ensure_worker_exists;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireSupervisor;
use crate::query::StatusListParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_request_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<ProductionRequest> {
    ProductionRepo::find_request(pool, id)
        .await?
        .ok_or_else(|| not_found(id))
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "ProductionRequest",
        id,
    })
}

fn closed(status: ProductionRequestStatus) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Request is {}",
        status.as_str()
    )))
}

// ---------------------------------------------------------------------------
// POST /production/requests
// ---------------------------------------------------------------------------

pub async fn create_request(
    RequireSupervisor(user): RequireSupervisor,
    State(state): State<AppState>,
    Json(input): Json<CreateProductionRequest>,
) -> AppResult<impl IntoResponse> {
    validate_new_request(&input.product_name, input.quantity_requested)?;

    let request = ProductionRepo::create_request(&state.pool, &input).await?;

    tracing::info!(
        request_id = request.id,
        product = %request.product_name,
        quantity = request.quantity_requested,
        actor = %user.subject,
        "Production request created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

// ---------------------------------------------------------------------------
// GET /production/requests
// ---------------------------------------------------------------------------

pub async fn list_requests(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<StatusListParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = params.status.as_deref() {
        ProductionRequestStatus::parse(status)?;
    }
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(params.offset);

    let requests =
        ProductionRepo::list_requests(&state.pool, params.status.as_deref(), limit, offset).await?;
    Ok(Json(DataResponse { data: requests }))
}

// ---------------------------------------------------------------------------
// GET /production/requests/{id}
// ---------------------------------------------------------------------------

pub async fn get_request(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = ensure_request_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: request }))
}

// ---------------------------------------------------------------------------
// POST /production/requests/{id}/cancel
// ---------------------------------------------------------------------------

/// Cancel an open request. Fulfilled and cancelled requests answer 409.
pub async fn cancel_request(
    RequireSupervisor(user): RequireSupervisor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let existing = ensure_request_exists(&state.pool, id).await?;
    let Some(request) = ProductionRepo::cancel_request(&state.pool, id).await? else {
        return Err(closed(ProductionRequestStatus::parse(&existing.status)?));
    };

    tracing::info!(request_id = id, actor = %user.subject, "Production request cancelled");

    Ok(Json(DataResponse { data: request }))
}

// ---------------------------------------------------------------------------
// POST /production/requests/{id}/log
// ---------------------------------------------------------------------------

/// Log finished units. The log row and the completed-count bump are written
/// in one transaction; reaching the requested quantity fulfils the request.
pub async fn log_production(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<LogProduction>,
) -> AppResult<impl IntoResponse> {
    let request = ensure_request_exists(&state.pool, id).await?;
    validate_log_quantity(ProductionRequestStatus::parse(&request.status)?, input.quantity)?;
    if let Some(worker_id) = input.worker_id {
        ensure_worker_exists(&state.pool, worker_id).await?;
    }

    let logged = ProductionRepo::log_production(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?
        .map_err(closed)?;

    tracing::info!(
        request_id = id,
        quantity = input.quantity,
        completed = logged.request.quantity_completed,
        status = %logged.request.status,
        actor = %user.subject,
        "Production logged",
    );

    state.event_bus.publish(
        PlatformEvent::new(names::PRODUCTION_LOGGED)
            .with_source("production_request", id)
            .with_actor(user.subject.as_str())
            .with_payload(json!({
                "request_id": id,
                "log_id": logged.log.id,
                "quantity": input.quantity,
                "quantity_completed": logged.request.quantity_completed,
                "status": logged.request.status,
            })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: logged })))
}

// ---------------------------------------------------------------------------
// GET /production/requests/{id}/logs
// ---------------------------------------------------------------------------

pub async fn list_logs(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_request_exists(&state.pool, id).await?;
    let logs = ProductionRepo::list_logs(&state.pool, id).await?;
    Ok(Json(DataResponse { data: logs }))
}
