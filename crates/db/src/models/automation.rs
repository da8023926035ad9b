//! Automation rule and execution models.
//!
//! Rule parts are stored as JSONB but only ever written from the typed
//! `Trigger`/`Condition`/`Action` unions, so reads decode cleanly.

use serde::{Deserialize, Serialize};
use shopfloor_core::automation::{Action, Condition, Trigger};
use shopfloor_core::types::{DbId, Timestamp};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A row from the `automation_rules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AutomationRule {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub trigger: serde_json::Value,
    pub conditions: serde_json::Value,
    pub actions: serde_json::Value,
    pub is_enabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A rule with its JSON parts decoded.
#[derive(Debug, Clone)]
pub struct ParsedRule {
    pub id: DbId,
    pub name: String,
    pub trigger: Trigger,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
}

impl AutomationRule {
    pub fn parse(&self) -> Result<ParsedRule, serde_json::Error> {
        Ok(ParsedRule {
            id: self.id,
            name: self.name.clone(),
            trigger: serde_json::from_value(self.trigger.clone())?,
            conditions: serde_json::from_value(self.conditions.clone())?,
            actions: serde_json::from_value(self.actions.clone())?,
        })
    }
}

/// A row from the `automation_executions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AutomationExecution {
    pub id: DbId,
    pub rule_id: DbId,
    pub event_type: String,
    pub batch_id: Option<DbId>,
    pub succeeded: bool,
    pub error: Option<String>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create / update DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAutomationRule {
    pub name: String,
    pub description: Option<String>,
    pub trigger: Trigger,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAutomationRule {
    pub name: Option<String>,
    pub description: Option<String>,
    pub trigger: Option<Trigger>,
    pub conditions: Option<Vec<Condition>>,
    pub actions: Option<Vec<Action>>,
    pub is_enabled: Option<bool>,
}
