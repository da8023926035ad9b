//! Shared query parameter types for API handlers.

use serde::Deserialize;
use shopfloor_core::types::DbId;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Values are clamped in the handlers via `clamp_limit` / `clamp_offset`.
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for list endpoints with an `include_inactive` flag
/// (workflow templates, workers).
#[derive(Debug, Deserialize)]
pub struct IncludeInactiveParams {
    #[serde(default)]
    pub include_inactive: bool,
}

/// `?status=&limit=&offset=` for list endpoints filtered by status.
#[derive(Debug, Deserialize)]
pub struct StatusListParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?workflow_template_id=` selecting a template, falling back to the default.
#[derive(Debug, Deserialize)]
pub struct TemplateParams {
    pub workflow_template_id: Option<DbId>,
}
