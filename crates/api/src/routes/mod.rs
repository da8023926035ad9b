pub mod automation;
pub mod batches;
pub mod health;
pub mod orders;
pub mod production;
pub mod repairs;
pub mod settings;
pub mod shopify;
pub mod tasks;
pub mod workers;
pub mod workflows;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /workflows                         templates (stages + generated transitions)
/// /batches                           batches, transitions, flow board
/// /shopify                           storefront sync, products, import
/// /orders                            synced orders with items
/// /tasks                             work tasks, assignment, QC
/// /workers                           worker roster
/// /production                        production requests and logs
/// /repairs                           repair intake
/// /automation                        automation rules and executions
/// /settings                          key/value settings
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/workflows", workflows::router())
        .nest("/batches", batches::router())
        .nest("/shopify", shopify::router())
        .nest("/orders", orders::router())
        .nest("/tasks", tasks::router())
        .nest("/workers", workers::router())
        .nest("/production", production::router())
        .nest("/repairs", repairs::router())
        .nest("/automation", automation::router())
        .nest("/settings", settings::router())
}
