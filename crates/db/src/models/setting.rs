//! Key/value settings rows.

use serde::{Deserialize, Serialize};
use shopfloor_core::types::Timestamp;
use sqlx::FromRow;

/// A row from the `settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for `PUT /settings/{key}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PutSetting {
    pub value: serde_json::Value,
}
