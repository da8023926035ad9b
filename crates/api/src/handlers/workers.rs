//! Handlers for the `/workers` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use shopfloor_core::error::CoreError;
use shopfloor_core::roles::{is_valid_role, ALL_ROLES};
use shopfloor_core::types::DbId;
use shopfloor_db::models::worker::{CreateWorker, UpdateWorker, Worker};
use shopfloor_db::repositories::{WorkTaskRepo, WorkerRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireManager;
use crate::query::IncludeInactiveParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) async fn ensure_worker_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<Worker> {
    WorkerRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "Worker", id }))
}

fn validate_role(role: Option<&str>) -> AppResult<()> {
    match role {
        Some(role) if !is_valid_role(role) => Err(AppError::Core(CoreError::Validation(format!(
            "Invalid role '{role}'. Must be one of: {}",
            ALL_ROLES.join(", ")
        )))),
        _ => Ok(()),
    }
}

fn validate_required(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "{field} is required"
        ))));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// GET /workers
// ---------------------------------------------------------------------------

pub async fn list_workers(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<impl IntoResponse> {
    let workers = WorkerRepo::list(&state.pool, params.include_inactive).await?;
    Ok(Json(DataResponse { data: workers }))
}

// ---------------------------------------------------------------------------
// POST /workers
// ---------------------------------------------------------------------------

pub async fn create_worker(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Json(input): Json<CreateWorker>,
) -> AppResult<impl IntoResponse> {
    validate_required("name", &input.name)?;
    validate_required("email", &input.email)?;
    validate_role(input.role.as_deref())?;

    let worker = WorkerRepo::create(&state.pool, &input).await?;

    tracing::info!(
        worker_id = worker.id,
        role = %worker.role,
        actor = %user.subject,
        "Worker created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: worker })))
}

// ---------------------------------------------------------------------------
// GET /workers/{id}
// ---------------------------------------------------------------------------

pub async fn get_worker(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let worker = ensure_worker_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: worker }))
}

// ---------------------------------------------------------------------------
// PUT /workers/{id}
// ---------------------------------------------------------------------------

pub async fn update_worker(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWorker>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &input.name {
        validate_required("name", name)?;
    }
    if let Some(email) = &input.email {
        validate_required("email", email)?;
    }
    validate_role(input.role.as_deref())?;

    let worker = WorkerRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Worker", id }))?;

    tracing::info!(worker_id = id, actor = %user.subject, "Worker updated");

    Ok(Json(DataResponse { data: worker }))
}

// ---------------------------------------------------------------------------
// DELETE /workers/{id}
// ---------------------------------------------------------------------------

/// Soft delete: the worker is marked inactive and keeps their task history.
pub async fn deactivate_worker(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !WorkerRepo::deactivate(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Worker", id }));
    }
    tracing::info!(worker_id = id, actor = %user.subject, "Worker deactivated");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /workers/{id}/tasks
// ---------------------------------------------------------------------------

pub async fn list_worker_tasks(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_worker_exists(&state.pool, id).await?;
    let tasks = WorkTaskRepo::open_for_worker(&state.pool, id).await?;
    Ok(Json(DataResponse { data: tasks }))
}
