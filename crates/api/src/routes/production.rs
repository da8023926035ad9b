//! Route definitions for production requests.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::production;
use crate::state::AppState;

/// Routes mounted at `/production`.
///
/// ```text
/// GET    /requests                -> list_requests (?status, limit, offset)
/// POST   /requests                -> create_request
/// GET    /requests/{id}           -> get_request
/// POST   /requests/{id}/cancel    -> cancel_request
/// POST   /requests/{id}/log       -> log_production
/// GET    /requests/{id}/logs      -> list_logs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/requests",
            get(production::list_requests).post(production::create_request),
        )
        .route("/requests/{id}", get(production::get_request))
        .route("/requests/{id}/cancel", post(production::cancel_request))
        .route("/requests/{id}/log", post(production::log_production))
        .route("/requests/{id}/logs", get(production::list_logs))
}
