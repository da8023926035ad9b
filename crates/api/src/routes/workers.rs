use axum::routing::get;
use axum::Router;

use crate::handlers::workers;
use crate::state::AppState;

/// Routes mounted at `/workers`. Writes require the manager role.
///
/// ```text
/// GET    /                -> list_workers (?include_inactive)
/// POST   /                -> create_worker
/// GET    /{id}            -> get_worker
/// PUT    /{id}            -> update_worker
/// DELETE /{id}            -> deactivate_worker
/// GET    /{id}/tasks      -> list_worker_tasks (open tasks)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(workers::list_workers).post(workers::create_worker))
        .route(
            "/{id}",
            get(workers::get_worker)
                .put(workers::update_worker)
                .delete(workers::deactivate_worker),
        )
        .route("/{id}/tasks", get(workers::list_worker_tasks))
}
