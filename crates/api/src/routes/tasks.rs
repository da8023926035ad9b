//! Route definitions for the `/tasks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /                -> list_tasks (?status, worker_id, task_type, limit, offset)
/// GET    /{id}            -> get_task
/// POST   /{id}/assign     -> assign_task
/// POST   /{id}/start      -> start_task
/// POST   /{id}/complete   -> complete_task
/// POST   /{id}/qc         -> record_qc_result
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list_tasks))
        .route("/{id}", get(tasks::get_task))
        .route("/{id}/assign", post(tasks::assign_task))
        .route("/{id}/start", post(tasks::start_task))
        .route("/{id}/complete", post(tasks::complete_task))
        .route("/{id}/qc", post(tasks::record_qc_result))
}
