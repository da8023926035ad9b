//! Handlers for the `/batches` resource and the flow board.
//!
//! [`apply_transition`], [`change_status`] and [`complete_if_done`] are also
//! called by task handlers and the automation runner, so they take the pool
//! and bus directly instead of `AppState`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shopfloor_core::automation::CHAIN_DEPTH_KEY;
use shopfloor_core::batch::{
    resolve_transition, validate_new_batch, BatchStatus, TransitionTarget, DEFAULT_BATCH_TYPE,
};
use shopfloor_core::board::{build_board, BoardColumn};
use shopfloor_core::error::CoreError;
use shopfloor_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use shopfloor_core::types::DbId;
use shopfloor_core::workflow::Stage;
use shopfloor_db::models::batch::{
    Batch, CreateBatch, StageChange, TransitionBatch, UpdateBatchStatus,
};
use shopfloor_db::repositories::{BatchRepo, EventRepo, OrderRepo, WorkflowTemplateRepo};
use shopfloor_events::{names, EventBus, PlatformEvent};

use crate::error::{AppError, AppResult};
use crate::handlers::workflows::ensure_template_exists;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireManager, RequireSupervisor};
use crate::query::{PaginationParams, TemplateParams};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct BatchListParams {
    pub status: Option<String>,
    pub workflow_template_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// The flow board for one template.
#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub workflow_template_id: DbId,
    pub template_name: String,
    pub columns: Vec<BoardColumn<Batch>>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) async fn ensure_batch_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<Batch> {
    BatchRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "Batch", id }))
}

/// The batch was modified between our read and our write.
fn changed_concurrently(batch_id: DbId) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Batch {batch_id} was changed by another request; reload and retry"
    )))
}

/// Stage list of the batch's template. `None` when the batch has no template
/// or the template has since been deleted.
pub(crate) async fn template_stages(
    pool: &sqlx::PgPool,
    batch: &Batch,
) -> AppResult<Option<Vec<Stage>>> {
    let Some(template_id) = batch.workflow_template_id else {
        return Ok(None);
    };
    let Some(template) = WorkflowTemplateRepo::find_by_id(pool, template_id).await? else {
        return Ok(None);
    };
    let stages = template.parsed_stages().map_err(|e| {
        AppError::InternalError(format!(
            "Stored stages of template {template_id} are invalid: {e}"
        ))
    })?;
    Ok(Some(stages))
}

fn batch_event(
    name: &str,
    batch_id: DbId,
    actor: Option<&str>,
    depth: u64,
    mut payload: serde_json::Value,
) -> PlatformEvent {
    payload["batch_id"] = batch_id.into();
    payload[CHAIN_DEPTH_KEY] = depth.into();
    let event = PlatformEvent::new(name)
        .with_source("batch", batch_id)
        .with_payload(payload);
    match actor {
        Some(actor) => event.with_actor(actor),
        None => event,
    }
}

/// Move a batch to `to_stage` (`None`, `""` or `"pending"` for the pending
/// column), record history and publish `batch.stage_entered`.
///
/// `actor` is `None` for automation; `depth` is the automation chain depth
/// of the event that caused this move (0 for user actions).
pub async fn apply_transition(
    pool: &sqlx::PgPool,
    bus: &EventBus,
    batch_id: DbId,
    to_stage: Option<&str>,
    notes: Option<&str>,
    actor: Option<&str>,
    depth: u64,
) -> AppResult<Batch> {
    let batch = ensure_batch_exists(pool, batch_id).await?;
    let status = BatchStatus::parse(&batch.status)?;
    let stages = template_stages(pool, &batch).await?;

    let target = TransitionTarget::from_request(to_stage);
    let resolved = resolve_transition(status, stages.as_deref(), &target)?;

    let updated = BatchRepo::apply_stage_change(
        pool,
        batch_id,
        &StageChange {
            from_stage: batch.current_stage.as_deref(),
            to_stage: resolved.current_stage.as_deref(),
            from_status: status.as_str(),
            status: resolved.status.as_str(),
            notes,
            transitioned_by: actor,
        },
    )
    .await?
    .ok_or_else(|| changed_concurrently(batch_id))?;

    tracing::info!(
        batch_id,
        from_stage = ?batch.current_stage,
        to_stage = ?resolved.current_stage,
        actor = actor.unwrap_or("automation"),
        "Batch transitioned",
    );

    if let Some(stage_code) = &resolved.current_stage {
        bus.publish(batch_event(
            names::BATCH_STAGE_ENTERED,
            batch_id,
            actor,
            depth,
            json!({
                "stage_code": stage_code,
                "from_stage": batch.current_stage,
            }),
        ));
    }
    if resolved.status != status {
        bus.publish(batch_event(
            names::BATCH_STATUS_CHANGED,
            batch_id,
            actor,
            depth,
            json!({ "from": status.as_str(), "to": resolved.status.as_str() }),
        ));
    }

    Ok(updated)
}

/// Set a batch's coarse status, publishing `batch.status_changed` (and
/// `batch.completed` when it becomes completed). Setting the current status
/// again is a no-op.
pub async fn change_status(
    pool: &sqlx::PgPool,
    bus: &EventBus,
    batch_id: DbId,
    status: BatchStatus,
    actor: Option<&str>,
    depth: u64,
) -> AppResult<Batch> {
    let batch = ensure_batch_exists(pool, batch_id).await?;
    let current = BatchStatus::parse(&batch.status)?;
    if current == status {
        return Ok(batch);
    }

    let updated = BatchRepo::set_status(pool, batch_id, current, status)
        .await?
        .ok_or_else(|| changed_concurrently(batch_id))?;

    tracing::info!(
        batch_id,
        from = %current,
        to = %status,
        actor = actor.unwrap_or("automation"),
        "Batch status changed",
    );

    bus.publish(batch_event(
        names::BATCH_STATUS_CHANGED,
        batch_id,
        actor,
        depth,
        json!({ "from": current.as_str(), "to": status.as_str() }),
    ));
    if status == BatchStatus::Completed {
        bus.publish(batch_event(names::BATCH_COMPLETED, batch_id, actor, depth, json!({})));
    }

    Ok(updated)
}

/// Complete the batch if every task of every item in it is completed.
/// Returns whether this call completed it.
pub async fn complete_if_done(
    pool: &sqlx::PgPool,
    bus: &EventBus,
    batch_id: DbId,
    actor: Option<&str>,
) -> AppResult<bool> {
    if !BatchRepo::complete_if_done(pool, batch_id).await? {
        return Ok(false);
    }

    tracing::info!(batch_id, "All tasks done, batch completed");
    bus.publish(batch_event(
        names::BATCH_STATUS_CHANGED,
        batch_id,
        actor,
        0,
        json!({ "to": BatchStatus::Completed.as_str() }),
    ));
    bus.publish(batch_event(names::BATCH_COMPLETED, batch_id, actor, 0, json!({})));
    Ok(true)
}

// ---------------------------------------------------------------------------
// POST /batches
// ---------------------------------------------------------------------------

/// Create a batch in the pending column. Without an explicit template the
/// default template (if any) is used.
pub async fn create_batch(
    RequireSupervisor(user): RequireSupervisor,
    State(state): State<AppState>,
    Json(input): Json<CreateBatch>,
) -> AppResult<impl IntoResponse> {
    let mut item_ids = input.order_item_ids.clone();
    item_ids.sort_unstable();
    item_ids.dedup();
    validate_new_batch(&input.name, item_ids.len())?;

    let existing = OrderRepo::count_existing_items(&state.pool, &item_ids).await?;
    if existing != item_ids.len() as i64 {
        return Err(AppError::Core(CoreError::Validation(
            "One or more order items do not exist".to_string(),
        )));
    }

    let template_id = match input.workflow_template_id {
        Some(id) => {
            let template = ensure_template_exists(&state.pool, id).await?;
            if !template.is_active {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "Workflow template {id} is inactive"
                ))));
            }
            Some(id)
        }
        None => WorkflowTemplateRepo::find_default(&state.pool)
            .await?
            .map(|t| t.id),
    };

    let batch_type = input
        .batch_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_BATCH_TYPE);

    let batch = BatchRepo::create(
        &state.pool,
        input.name.trim(),
        batch_type,
        template_id,
        &item_ids,
    )
    .await?;

    tracing::info!(
        batch_id = batch.id,
        items = item_ids.len(),
        workflow_template_id = ?template_id,
        actor = %user.subject,
        "Batch created",
    );

    state.event_bus.publish(batch_event(
        names::BATCH_CREATED,
        batch.id,
        Some(&user.subject),
        0,
        json!({
            "name": batch.name,
            "batch_type": batch.batch_type,
            "order_item_ids": batch.order_item_ids,
        }),
    ));

    Ok((StatusCode::CREATED, Json(DataResponse { data: batch })))
}

// ---------------------------------------------------------------------------
// GET /batches
// ---------------------------------------------------------------------------

pub async fn list_batches(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<BatchListParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = params.status.as_deref() {
        BatchStatus::parse(status)?;
    }
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(params.offset);

    let batches = BatchRepo::list(
        &state.pool,
        params.status.as_deref(),
        params.workflow_template_id,
        limit,
        offset,
    )
    .await?;
    Ok(Json(DataResponse { data: batches }))
}

// ---------------------------------------------------------------------------
// GET /batches/board
// ---------------------------------------------------------------------------

/// Batches of one template bucketed into board columns: pending first, then
/// one column per stage in template order, then `unknown` for batches whose
/// stage is no longer part of the template.
pub async fn get_board(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TemplateParams>,
) -> AppResult<impl IntoResponse> {
    let template = match params.workflow_template_id {
        Some(id) => ensure_template_exists(&state.pool, id).await?,
        None => WorkflowTemplateRepo::find_default(&state.pool)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(
                    "No workflow_template_id given and no default template is configured"
                        .to_string(),
                )
            })?,
    };

    let stages = template.parsed_stages().map_err(|e| {
        AppError::InternalError(format!(
            "Stored stages of template {} are invalid: {e}",
            template.id
        ))
    })?;
    let batches = BatchRepo::list_for_board(&state.pool, template.id).await?;
    let columns = build_board(&stages, batches, |b| b.current_stage.as_deref());

    Ok(Json(DataResponse {
        data: BoardResponse {
            workflow_template_id: template.id,
            template_name: template.name,
            columns,
        },
    }))
}

// ---------------------------------------------------------------------------
// GET /batches/{id}
// ---------------------------------------------------------------------------

pub async fn get_batch(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let batch = ensure_batch_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: batch }))
}

// ---------------------------------------------------------------------------
// DELETE /batches/{id}
// ---------------------------------------------------------------------------

/// Delete a batch. Its items become free to join another batch; their tasks
/// are untouched.
pub async fn delete_batch(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !BatchRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Batch", id }));
    }
    tracing::info!(batch_id = id, actor = %user.subject, "Batch deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// POST /batches/{id}/transition
// ---------------------------------------------------------------------------

/// Move a batch to another board column. Any stage of the batch's template
/// may be targeted; adjacency in the transition chain is not required.
pub async fn transition_batch(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<TransitionBatch>,
) -> AppResult<impl IntoResponse> {
    let batch = apply_transition(
        &state.pool,
        &state.event_bus,
        id,
        input.to_stage.as_deref(),
        input.notes.as_deref(),
        Some(&user.subject),
        0,
    )
    .await?;
    Ok(Json(DataResponse { data: batch }))
}

// ---------------------------------------------------------------------------
// PUT /batches/{id}/status
// ---------------------------------------------------------------------------

pub async fn update_batch_status(
    RequireSupervisor(user): RequireSupervisor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBatchStatus>,
) -> AppResult<impl IntoResponse> {
    let status = BatchStatus::parse(&input.status)?;
    let batch = change_status(
        &state.pool,
        &state.event_bus,
        id,
        status,
        Some(&user.subject),
        0,
    )
    .await?;
    Ok(Json(DataResponse { data: batch }))
}

// ---------------------------------------------------------------------------
// GET /batches/{id}/history
// ---------------------------------------------------------------------------

pub async fn list_batch_history(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_batch_exists(&state.pool, id).await?;
    let history = BatchRepo::history(&state.pool, id).await?;
    Ok(Json(DataResponse { data: history }))
}

// ---------------------------------------------------------------------------
// GET /batches/{id}/events
// ---------------------------------------------------------------------------

/// Activity feed: every persisted event about this batch, newest first.
/// Events are written by the persistence task, so the feed may trail the
/// latest write briefly.
pub async fn list_batch_events(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    ensure_batch_exists(&state.pool, id).await?;
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let events = EventRepo::list_for_source(&state.pool, "batch", id, limit).await?;
    Ok(Json(DataResponse { data: events }))
}
