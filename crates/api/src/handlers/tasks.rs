//! Handlers for the `/tasks` resource: assignment, progress and QC.
//!
//! Status moves are checked with `validate_task_transition` before any
//! write, and the write only lands if the status is still the one checked. Completing the last open task of a batch completes the batch.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use shopfloor_core::assignment::{choose_worker, AssignmentContext, WorkerLoad};
use shopfloor_core::error::CoreError;
use shopfloor_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use shopfloor_core::tasks::{validate_task_transition, TaskStatus, TaskType};
use shopfloor_core::types::DbId;
use shopfloor_core::workflow::{find_stage, AutoAssignRule};
use shopfloor_db::models::work_task::{AssignTask, CompleteTask, QcResult, TaskListParams, WorkTask};
use shopfloor_db::repositories::{BatchRepo, WorkTaskRepo, WorkerRepo};
use shopfloor_events::{names, PlatformEvent};

use crate::error::{AppError, AppResult};
use crate::handlers::batches::{complete_if_done, ensure_batch_exists, template_stages};
use crate::handlers::workers::ensure_worker_exists;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireSupervisor;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_task_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<WorkTask> {
    WorkTaskRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "WorkTask", id }))
}

/// The task's status moved between our read and our write.
fn changed_concurrently(id: DbId) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Task {id} was changed by another request; reload and retry"
    )))
}

fn parse_task(task: &WorkTask) -> AppResult<(TaskType, TaskStatus)> {
    Ok((TaskType::parse(&task.task_type)?, TaskStatus::parse(&task.status)?))
}

/// The auto-assign rule of the stage matching the task type in the
/// template of the item's batch. Items outside a batch, or batches whose
/// template has no such stage, fall back to `manual`.
async fn stage_rule(
    pool: &sqlx::PgPool,
    task: &WorkTask,
    task_type: TaskType,
) -> AppResult<(AutoAssignRule, Option<DbId>)> {
    let Some(batch_id) = BatchRepo::batch_id_for_item(pool, task.order_item_id).await? else {
        return Ok((AutoAssignRule::Manual, None));
    };
    let batch = ensure_batch_exists(pool, batch_id).await?;
    let stages = template_stages(pool, &batch).await?.unwrap_or_default();

    Ok(find_stage(&stages, task_type.as_str())
        .map(|stage| (stage.auto_assign_rule, stage.specific_worker_id))
        .unwrap_or((AutoAssignRule::Manual, None)))
}

/// Pick a worker for `task` with `rule`, using current workloads.
async fn auto_pick(
    pool: &sqlx::PgPool,
    task_type: TaskType,
    rule: AutoAssignRule,
    specific_worker_id: Option<DbId>,
) -> AppResult<DbId> {
    if rule == AutoAssignRule::Manual {
        return Err(AppError::Core(CoreError::Validation(
            "worker_id is required when no auto-assign rule applies".to_string(),
        )));
    }

    let workers: Vec<WorkerLoad> = WorkerRepo::load_snapshot(pool)
        .await?
        .into_iter()
        .map(|row| WorkerLoad {
            worker_id: row.id,
            skills: row.skills,
            is_active: row.is_active,
            open_tasks: row.open_tasks,
        })
        .collect();

    let last_assigned = if rule == AutoAssignRule::RoundRobin {
        WorkTaskRepo::last_assigned_worker(pool, task_type.as_str()).await?
    } else {
        None
    };

    choose_worker(
        rule,
        &workers,
        AssignmentContext {
            required_skill: Some(task_type.required_skill()),
            last_assigned,
            specific_worker_id,
        },
    )
    .ok_or_else(|| {
        AppError::Core(CoreError::Conflict(format!(
            "No eligible worker for {} task ({} rule)",
            task_type.as_str(),
            rule.as_str()
        )))
    })
}

/// Mark a task completed and run the follow-ups: redone assembly reopens a
/// failed QC, `task.completed` is published, and the batch completes if
/// nothing is left open.
async fn finish_task(
    state: &AppState,
    task: &WorkTask,
    task_type: TaskType,
    from: TaskStatus,
    notes: Option<&str>,
    actor: &str,
) -> AppResult<WorkTask> {
    let updated =
        WorkTaskRepo::set_status(&state.pool, task.id, from, TaskStatus::Completed, notes)
            .await?
            .ok_or_else(|| changed_concurrently(task.id))?;

    if task_type == TaskType::Assembly {
        if let Some(qc) = WorkTaskRepo::reopen_failed_qc(&state.pool, task.order_item_id).await? {
            tracing::info!(task_id = qc.id, "QC task reopened after assembly rework");
        }
    }

    let batch_id = BatchRepo::batch_id_for_item(&state.pool, task.order_item_id).await?;

    tracing::info!(
        task_id = task.id,
        task_type = task_type.as_str(),
        batch_id = ?batch_id,
        actor = %actor,
        "Task completed",
    );

    state.event_bus.publish(
        PlatformEvent::new(names::TASK_COMPLETED)
            .with_source("work_task", task.id)
            .with_actor(actor)
            .with_payload(json!({
                "task_id": task.id,
                "task_type": task_type.as_str(),
                "order_item_id": task.order_item_id,
                "batch_id": batch_id,
            })),
    );

    if let Some(batch_id) = batch_id {
        complete_if_done(&state.pool, &state.event_bus, batch_id, Some(actor)).await?;
    }

    Ok(updated)
}

// ---------------------------------------------------------------------------
// GET /tasks
// ---------------------------------------------------------------------------

pub async fn list_tasks(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = params.status.as_deref() {
        TaskStatus::parse(status)?;
    }
    if let Some(task_type) = params.task_type.as_deref() {
        TaskType::parse(task_type)?;
    }
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(params.offset);

    let tasks = WorkTaskRepo::list(&state.pool, &params, limit, offset).await?;
    Ok(Json(DataResponse { data: tasks }))
}

// ---------------------------------------------------------------------------
// GET /tasks/{id}
// ---------------------------------------------------------------------------

pub async fn get_task(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let task = ensure_task_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: task }))
}

// ---------------------------------------------------------------------------
// POST /tasks/{id}/assign
// ---------------------------------------------------------------------------

/// Assign a task to `worker_id`, or let `rule` (else the matching stage's
/// configured rule) pick a worker.
pub async fn assign_task(
    RequireSupervisor(user): RequireSupervisor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AssignTask>,
) -> AppResult<impl IntoResponse> {
    let task = ensure_task_exists(&state.pool, id).await?;
    let (task_type, status) = parse_task(&task)?;
    validate_task_transition(task_type, status, TaskStatus::Assigned)?;

    let worker_id = match input.worker_id {
        Some(worker_id) => {
            let worker = ensure_worker_exists(&state.pool, worker_id).await?;
            if !worker.is_active {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "Worker {worker_id} is inactive"
                ))));
            }
            worker_id
        }
        None => {
            let (rule, specific_worker_id) = match input.rule {
                Some(rule) => (rule, None),
                None => stage_rule(&state.pool, &task, task_type).await?,
            };
            auto_pick(&state.pool, task_type, rule, specific_worker_id).await?
        }
    };

    let task = WorkTaskRepo::assign(&state.pool, id, status, worker_id)
        .await?
        .ok_or_else(|| changed_concurrently(id))?;

    tracing::info!(task_id = id, worker_id, actor = %user.subject, "Task assigned");

    state.event_bus.publish(
        PlatformEvent::new(names::TASK_ASSIGNED)
            .with_source("work_task", id)
            .with_actor(user.subject.as_str())
            .with_payload(json!({
                "task_id": id,
                "task_type": task_type.as_str(),
                "worker_id": worker_id,
            })),
    );

    Ok(Json(DataResponse { data: task }))
}

// ---------------------------------------------------------------------------
// POST /tasks/{id}/start
// ---------------------------------------------------------------------------

pub async fn start_task(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let task = ensure_task_exists(&state.pool, id).await?;
    let (task_type, status) = parse_task(&task)?;
    validate_task_transition(task_type, status, TaskStatus::InProgress)?;

    let task = WorkTaskRepo::set_status(&state.pool, id, status, TaskStatus::InProgress, None)
        .await?
        .ok_or_else(|| changed_concurrently(id))?;

    tracing::info!(task_id = id, actor = %user.subject, "Task started");

    Ok(Json(DataResponse { data: task }))
}

// ---------------------------------------------------------------------------
// POST /tasks/{id}/complete
// ---------------------------------------------------------------------------

pub async fn complete_task(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CompleteTask>,
) -> AppResult<impl IntoResponse> {
    let task = ensure_task_exists(&state.pool, id).await?;
    let (task_type, status) = parse_task(&task)?;
    validate_task_transition(task_type, status, TaskStatus::Completed)?;

    let task = finish_task(
        &state,
        &task,
        task_type,
        status,
        input.notes.as_deref(),
        &user.subject,
    )
    .await?;
    Ok(Json(DataResponse { data: task }))
}

// ---------------------------------------------------------------------------
// POST /tasks/{id}/qc
// ---------------------------------------------------------------------------

/// Result of recording a QC outcome.
#[derive(Debug, Serialize)]
pub struct QcOutcome {
    pub task: WorkTask,
    /// The assembly task sent back for rework when QC failed.
    pub reopened_task: Option<WorkTask>,
}

/// Record a QC outcome. A pass completes the QC task; a fail marks it
/// `qc_failed` and reopens the item's assembly task.
pub async fn record_qc_result(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<QcResult>,
) -> AppResult<impl IntoResponse> {
    let task = ensure_task_exists(&state.pool, id).await?;
    let (task_type, status) = parse_task(&task)?;
    if task_type != TaskType::Qc {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Task {id} is a {} task, not a QC task",
            task_type.as_str()
        ))));
    }

    if input.passed {
        validate_task_transition(task_type, status, TaskStatus::Completed)?;
        let task = finish_task(
            &state,
            &task,
            task_type,
            status,
            input.notes.as_deref(),
            &user.subject,
        )
        .await?;
        return Ok(Json(DataResponse {
            data: QcOutcome {
                task,
                reopened_task: None,
            },
        }));
    }

    validate_task_transition(task_type, status, TaskStatus::QcFailed)?;
    let (task, reopened_task) =
        WorkTaskRepo::fail_qc(&state.pool, id, status, input.notes.as_deref())
            .await?
            .ok_or_else(|| changed_concurrently(id))?;

    tracing::info!(
        task_id = id,
        order_item_id = task.order_item_id,
        reopened_task_id = ?reopened_task.as_ref().map(|t| t.id),
        actor = %user.subject,
        "QC failed",
    );

    state.event_bus.publish(
        PlatformEvent::new(names::TASK_QC_FAILED)
            .with_source("work_task", id)
            .with_actor(user.subject.as_str())
            .with_payload(json!({
                "task_id": id,
                "order_item_id": task.order_item_id,
                "reopened_task_id": reopened_task.as_ref().map(|t| t.id),
                "notes": input.notes,
            })),
    );

    Ok(Json(DataResponse {
        data: QcOutcome {
            task,
            reopened_task,
        },
    }))
}
