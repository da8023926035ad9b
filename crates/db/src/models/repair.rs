//! Repair intake models and DTOs.

use serde::{Deserialize, Serialize};
use shopfloor_core::types::{DbId, Timestamp};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `repairs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Repair {
    pub id: DbId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub product_model: String,
    pub serial_number: Option<String>,
    pub issue_description: String,
    pub status: String,
    pub priority: String,
    pub estimated_cost: Option<f64>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRepair {
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub product_model: String,
    pub serial_number: Option<String>,
    pub issue_description: String,
    pub priority: Option<String>,
    pub estimated_cost: Option<f64>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Update DTO
// ---------------------------------------------------------------------------

/// Field edits. Status changes go through `UpdateRepairStatus`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRepair {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub product_model: Option<String>,
    pub serial_number: Option<String>,
    pub issue_description: Option<String>,
    pub priority: Option<String>,
    pub estimated_cost: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRepairStatus {
    pub status: String,
}
