//! Route definitions for automation rules.

use axum::routing::get;
use axum::Router;

use crate::handlers::automation;
use crate::state::AppState;

/// Routes mounted at `/automation`. Writes require the manager role.
///
/// ```text
/// GET    /rules                  -> list_rules
/// POST   /rules                  -> create_rule
/// GET    /rules/{id}             -> get_rule
/// PUT    /rules/{id}             -> update_rule
/// DELETE /rules/{id}             -> delete_rule
/// GET    /rules/{id}/executions  -> list_executions (?limit)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/rules",
            get(automation::list_rules).post(automation::create_rule),
        )
        .route(
            "/rules/{id}",
            get(automation::get_rule)
                .put(automation::update_rule)
                .delete(automation::delete_rule),
        )
        .route("/rules/{id}/executions", get(automation::list_executions))
}
