//! Production request and log models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shopfloor_core::types::{DbId, Timestamp};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A row from the `production_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductionRequest {
    pub id: DbId,
    pub product_name: String,
    pub quantity_requested: i32,
    pub quantity_completed: i32,
    pub status: String,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `production_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductionLog {
    pub id: DbId,
    pub request_id: DbId,
    pub worker_id: Option<DbId>,
    pub quantity: i32,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductionRequest {
    pub product_name: String,
    pub quantity_requested: i32,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Request body for `POST /production/requests/{id}/log`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogProduction {
    pub quantity: i32,
    pub worker_id: Option<DbId>,
    pub notes: Option<String>,
}

/// The request after a log entry, together with that entry.
#[derive(Debug, Clone, Serialize)]
pub struct LoggedProduction {
    pub request: ProductionRequest,
    pub log: ProductionLog,
}
