//! Route definitions for the `/batches` resource and the flow board.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::batches;
use crate::state::AppState;

/// Routes mounted at `/batches`.
///
/// ```text
/// GET    /                  -> list_batches (?status, workflow_template_id, limit, offset)
/// POST   /                  -> create_batch
/// GET    /board             -> get_board (?workflow_template_id)
/// GET    /{id}              -> get_batch
/// DELETE /{id}              -> delete_batch
/// POST   /{id}/transition   -> transition_batch
/// PUT    /{id}/status       -> update_batch_status
/// GET    /{id}/history      -> list_batch_history
/// GET    /{id}/events       -> list_batch_events (?limit)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(batches::list_batches).post(batches::create_batch))
        .route("/board", get(batches::get_board))
        .route(
            "/{id}",
            get(batches::get_batch).delete(batches::delete_batch),
        )
        .route("/{id}/transition", post(batches::transition_batch))
        .route("/{id}/status", put(batches::update_batch_status))
        .route("/{id}/history", get(batches::list_batch_history))
        .route("/{id}/events", get(batches::list_batch_events))
}
