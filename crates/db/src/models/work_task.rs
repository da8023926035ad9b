//! Work task models and DTOs.

use serde::{Deserialize, Serialize};
use shopfloor_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `work_tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkTask {
    pub id: DbId,
    pub order_item_id: DbId,
    pub task_type: String,
    pub status: String,
    pub sequence: i32,
    pub worker_id: Option<DbId>,
    pub notes: Option<String>,
    pub assigned_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Filters for `GET /tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListParams {
    pub status: Option<String>,
    pub worker_id: Option<DbId>,
    pub task_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request body for `POST /tasks/{id}/assign`.
///
/// With `worker_id` the task goes to that worker; otherwise `rule` (or the
/// stage's configured rule) picks one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignTask {
    pub worker_id: Option<DbId>,
    pub rule: Option<shopfloor_core::workflow::AutoAssignRule>,
}

/// Request body for `POST /tasks/{id}/complete`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteTask {
    pub notes: Option<String>,
}

/// Request body for `POST /tasks/{id}/qc`.
#[derive(Debug, Clone, Deserialize)]
pub struct QcResult {
    pub passed: bool,
    pub notes: Option<String>,
}
