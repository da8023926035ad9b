//! Batch, batch membership and stage history models.

use serde::{Deserialize, Serialize};
use shopfloor_core::types::{DbId, Timestamp};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `batches` table joined with its member item ids.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Batch {
    pub id: DbId,
    pub name: String,
    pub batch_type: String,
    pub workflow_template_id: Option<DbId>,
    pub current_stage: Option<String>,
    pub status: String,
    pub order_item_ids: Vec<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `batch_stage_history` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BatchStageHistory {
    pub id: DbId,
    pub batch_id: DbId,
    pub from_stage: Option<String>,
    pub to_stage: Option<String>,
    pub notes: Option<String>,
    pub transitioned_by: Option<String>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBatch {
    pub name: String,
    pub batch_type: Option<String>,
    pub order_item_ids: Vec<DbId>,
    pub workflow_template_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Transition / status DTOs
// ---------------------------------------------------------------------------

/// Request body for `POST /batches/{id}/transition`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionBatch {
    pub to_stage: Option<String>,
    pub notes: Option<String>,
}

/// Request body for `PUT /batches/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBatchStatus {
    pub status: String,
}

/// A stage change to persist, with its history entry.
#[derive(Debug, Clone)]
pub struct StageChange<'a> {
    pub from_stage: Option<&'a str>,
    pub to_stage: Option<&'a str>,
    /// Status the caller read; the write is skipped if it has moved on.
    pub from_status: &'a str,
    pub status: &'a str,
    pub notes: Option<&'a str>,
    pub transitioned_by: Option<&'a str>,
}
