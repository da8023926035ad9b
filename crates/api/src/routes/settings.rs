use axum::routing::get;
use axum::Router;

use crate::handlers::settings;
use crate::state::AppState;

/// Routes mounted at `/settings`.
///
/// ```text
/// GET    /{key}           -> get_setting
/// PUT    /{key}           -> put_setting (manager)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{key}",
        get(settings::get_setting).put(settings::put_setting),
    )
}
