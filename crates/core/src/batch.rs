//! Batch status and stage-transition rules.
//!
//! A batch carries a nullable `current_stage` (null means the pending
//! column) and a coarse [`BatchStatus`]. Moving a batch between board
//! columns is resolved here into the new stage value and status.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::workflow::{find_stage, Stage, PENDING_STAGE};

/// `batch_type` used when a batch is created without one.
pub const DEFAULT_BATCH_TYPE: &str = "standard";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Coarse lifecycle status of a production batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Active,
    Completed,
    OnHold,
}

impl BatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::OnHold => "on_hold",
        }
    }

    /// Parse a status string as stored in `batches.status`.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "on_hold" => Ok(Self::OnHold),
            other => Err(CoreError::Validation(format!(
                "Unknown batch status: '{other}'. Valid statuses: pending, active, completed, on_hold"
            ))),
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transition resolution
// ---------------------------------------------------------------------------

/// Where a transition request wants the batch to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionTarget {
    /// Back to the pending column (`current_stage = NULL`).
    Pending,
    /// Into the named stage.
    Stage(String),
}

impl TransitionTarget {
    /// Interpret the raw `to_stage` field of a transition request.
    ///
    /// `None`, an empty string, and the literal `"pending"` all mean pending.
    pub fn from_request(to_stage: Option<&str>) -> Self {
        match to_stage.map(str::trim) {
            None | Some("") => Self::Pending,
            Some(code) if code == PENDING_STAGE => Self::Pending,
            Some(code) => Self::Stage(code.to_string()),
        }
    }

    /// The value to store in `batches.current_stage`.
    pub fn stage_code(&self) -> Option<&str> {
        match self {
            Self::Pending => None,
            Self::Stage(code) => Some(code),
        }
    }
}

/// The outcome of a resolved transition: the new stage and status to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTransition {
    pub current_stage: Option<String>,
    pub status: BatchStatus,
}

/// Resolve a board move for a batch.
///
/// Any stage of the batch's template is reachable from any column: adjacency
/// in the transition chain is not enforced. The target must exist in the
/// template's stage list (when the batch has a template), and completed
/// batches cannot move. Moving into a stage makes the batch `active`,
/// except that `on_hold` batches keep their status; moving back to pending
/// makes it `pending`.
pub fn resolve_transition(
    current_status: BatchStatus,
    template_stages: Option<&[Stage]>,
    target: &TransitionTarget,
) -> Result<ResolvedTransition, CoreError> {
    if current_status == BatchStatus::Completed {
        return Err(CoreError::Conflict(
            "Completed batches cannot change stage".to_string(),
        ));
    }

    match target {
        TransitionTarget::Pending => Ok(ResolvedTransition {
            current_stage: None,
            status: BatchStatus::Pending,
        }),
        TransitionTarget::Stage(code) => {
            if let Some(stages) = template_stages {
                if find_stage(stages, code).is_none() {
                    return Err(CoreError::Validation(format!(
                        "Stage '{code}' is not part of this batch's workflow"
                    )));
                }
            }
            let status = if current_status == BatchStatus::OnHold {
                BatchStatus::OnHold
            } else {
                BatchStatus::Active
            };
            Ok(ResolvedTransition {
                current_stage: Some(code.clone()),
                status,
            })
        }
    }
}

/// Validate a batch name and item list at creation time.
pub fn validate_new_batch(name: &str, order_item_count: usize) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Batch name is required".to_string()));
    }
    if order_item_count == 0 {
        return Err(CoreError::Validation(
            "A batch must contain at least one order item".to_string(),
        ));
    }
    Ok(())
}
