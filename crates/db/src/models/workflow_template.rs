//! Workflow template models and DTOs.
//!
//! `stages` and `stage_transitions` are stored as JSONB arrays and always
//! written together: the API regenerates transitions from the stage list on
//! every save.

use serde::{Deserialize, Serialize};
use shopfloor_core::types::{DbId, Timestamp};
use shopfloor_core::workflow::{Stage, StageTransition};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `workflow_templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowTemplate {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub stages: serde_json::Value,
    pub stage_transitions: serde_json::Value,
    pub is_active: bool,
    pub is_default: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WorkflowTemplate {
    /// Decode the stored stage list.
    pub fn parsed_stages(&self) -> Result<Vec<Stage>, serde_json::Error> {
        serde_json::from_value(self.stages.clone())
    }
}

// ---------------------------------------------------------------------------
// Create / replace DTO
// ---------------------------------------------------------------------------

/// Request body for creating a template or replacing one wholesale.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveWorkflowTemplate {
    pub name: String,
    pub description: Option<String>,
    pub stages: Vec<Stage>,
    /// Accepted for compatibility with clients that echo the stored value;
    /// always replaced by the generated chain.
    #[serde(default)]
    pub stage_transitions: Option<Vec<StageTransition>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
}

fn default_true() -> bool {
    true
}
