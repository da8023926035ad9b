//! Handlers for repair intake.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use shopfloor_core::error::CoreError;
use shopfloor_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use shopfloor_core::repair::{validate_priority, validate_repair_transition, RepairStatus};
use shopfloor_core::types::DbId;
use shopfloor_db::models::repair::{CreateRepair, Repair, UpdateRepair, UpdateRepairStatus};
use shopfloor_db::repositories::RepairRepo;
use shopfloor_events::{names, PlatformEvent};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireManager;
use crate::query::StatusListParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_repair_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<Repair> {
    RepairRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "Repair", id }))
}

fn require_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "{field} is required"
        ))));
    }
    Ok(())
}

fn validate_cost(cost: Option<f64>) -> AppResult<()> {
    match cost {
        Some(c) if !c.is_finite() || c < 0.0 => Err(AppError::Core(CoreError::Validation(
            "estimated_cost must be a non-negative number".to_string(),
        ))),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// POST /repairs
// ---------------------------------------------------------------------------

/// Log a repair intake. New repairs start as `received`.
pub async fn create_repair(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateRepair>,
) -> AppResult<impl IntoResponse> {
    require_text("customer_name", &input.customer_name)?;
    require_text("product_model", &input.product_model)?;
    require_text("issue_description", &input.issue_description)?;
    if let Some(priority) = input.priority.as_deref() {
        validate_priority(priority)?;
    }
    validate_cost(input.estimated_cost)?;

    let repair = RepairRepo::create(&state.pool, &input).await?;

    tracing::info!(
        repair_id = repair.id,
        product_model = %repair.product_model,
        priority = %repair.priority,
        actor = %user.subject,
        "Repair received",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: repair })))
}

// ---------------------------------------------------------------------------
// GET /repairs
// ---------------------------------------------------------------------------

pub async fn list_repairs(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<StatusListParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = params.status.as_deref() {
        RepairStatus::parse(status)?;
    }
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(params.offset);

    let repairs = RepairRepo::list(&state.pool, params.status.as_deref(), limit, offset).await?;
    Ok(Json(DataResponse { data: repairs }))
}

// ---------------------------------------------------------------------------
// GET /repairs/{id}
// ---------------------------------------------------------------------------

pub async fn get_repair(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let repair = ensure_repair_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: repair }))
}

// ---------------------------------------------------------------------------
// PUT /repairs/{id}
// ---------------------------------------------------------------------------

pub async fn update_repair(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRepair>,
) -> AppResult<impl IntoResponse> {
    for (field, value) in [
        ("customer_name", &input.customer_name),
        ("product_model", &input.product_model),
        ("issue_description", &input.issue_description),
    ] {
        if let Some(value) = value {
            require_text(field, value)?;
        }
    }
    if let Some(priority) = input.priority.as_deref() {
        validate_priority(priority)?;
    }
    validate_cost(input.estimated_cost)?;

    let repair = RepairRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Repair", id }))?;

    tracing::info!(repair_id = id, actor = %user.subject, "Repair updated");

    Ok(Json(DataResponse { data: repair }))
}

// ---------------------------------------------------------------------------
// PUT /repairs/{id}/status
// ---------------------------------------------------------------------------

/// Move a repair along its status flow. Illegal moves answer 409.
pub async fn update_repair_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRepairStatus>,
) -> AppResult<impl IntoResponse> {
    let to = RepairStatus::parse(&input.status)?;
    let repair = ensure_repair_exists(&state.pool, id).await?;
    let from = RepairStatus::parse(&repair.status)?;
    validate_repair_transition(from, to)?;

    let repair = RepairRepo::update_status(&state.pool, id, from, to)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Repair status changed concurrently, reload and retry".to_string(),
            ))
        })?;

    tracing::info!(repair_id = id, from = %from, to = %to, actor = %user.subject, "Repair status changed");

    state.event_bus.publish(
        PlatformEvent::new(names::REPAIR_STATUS_CHANGED)
            .with_source("repair", id)
            .with_actor(user.subject.as_str())
            .with_payload(json!({
                "repair_id": id,
                "from": from.as_str(),
                "to": to.as_str(),
            })),
    );

    Ok(Json(DataResponse { data: repair }))
}

// ---------------------------------------------------------------------------
// DELETE /repairs/{id}
// ---------------------------------------------------------------------------

pub async fn delete_repair(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !RepairRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Repair", id }));
    }
    tracing::info!(repair_id = id, actor = %user.subject, "Repair deleted");
    Ok(StatusCode::NO_CONTENT)
}
