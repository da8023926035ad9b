//! Route definitions for the `/workflows` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::workflows;
use crate::state::AppState;

/// Routes mounted at `/workflows`. Writes require the manager role.
///
/// ```text
/// GET    /                -> list_templates (?include_inactive)
/// POST   /                -> create_template
/// GET    /{id}            -> get_template
/// PUT    /{id}            -> replace_template
/// DELETE /{id}            -> delete_template
/// POST   /{id}/default    -> set_default_template
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(workflows::list_templates).post(workflows::create_template),
        )
        .route(
            "/{id}",
            get(workflows::get_template)
                .put(workflows::replace_template)
                .delete(workflows::delete_template),
        )
        .route("/{id}/default", post(workflows::set_default_template))
}
