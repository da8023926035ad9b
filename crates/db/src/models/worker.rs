//! Worker models and DTOs.

use serde::{Deserialize, Serialize};
use shopfloor_core::types::{DbId, Timestamp};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `workers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Worker {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: String,
    pub skills: Vec<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An active-or-not worker together with their open task count, used by
/// auto-assignment.
#[derive(Debug, Clone, FromRow)]
pub struct WorkerLoadRow {
    pub id: DbId,
    pub skills: Vec<String>,
    pub is_active: bool,
    pub open_tasks: i64,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorker {
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

// ---------------------------------------------------------------------------
// Update DTO
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWorker {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub skills: Option<Vec<String>>,
    pub is_active: Option<bool>,
}
