use axum::routing::{get, put};
use axum::Router;

use crate::handlers::repairs;
use crate::state::AppState;

/// Routes mounted at `/repairs`.
///
/// ```text
/// GET    /                -> list_repairs (?status, limit, offset)
/// POST   /                -> create_repair
/// GET    /{id}            -> get_repair
/// PUT    /{id}            -> update_repair
/// DELETE /{id}            -> delete_repair
/// PUT    /{id}/status     -> update_repair_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(repairs::list_repairs).post(repairs::create_repair))
        .route(
            "/{id}",
            get(repairs::get_repair)
                .put(repairs::update_repair)
                .delete(repairs::delete_repair),
        )
        .route("/{id}/status", put(repairs::update_repair_status))
}
