//! Workflow template stage model and transition generation.
//!
//! A workflow template is an ordered list of [`Stage`]s. Its
//! [`StageTransition`]s are never authored directly: they are regenerated
//! from the stage list on every save by [`generate_transitions`], which
//! pairs consecutive stages into a single linear chain.
//!
//! This module lives in `core` (zero internal deps) so the transition chain
//! can be validated by the API layer and unit-tested without a database.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Reserved column code for batches that have not entered any stage.
///
/// A batch in this column has `current_stage = NULL` in the database.
pub const PENDING_STAGE: &str = "pending";

/// Maximum number of stages a single template may hold.
pub const MAX_STAGES_PER_TEMPLATE: usize = 50;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// How work items in a stage get a worker assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoAssignRule {
    /// Active worker with the required skill and fewest open tasks.
    LeastBusy,
    /// Next eligible worker after the last one assigned.
    RoundRobin,
    /// The worker named by [`Stage::specific_worker_id`].
    SpecificWorker,
    /// Nobody is assigned automatically.
    #[default]
    Manual,
}

impl AutoAssignRule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeastBusy => "least_busy",
            Self::RoundRobin => "round_robin",
            Self::SpecificWorker => "specific_worker",
            Self::Manual => "manual",
        }
    }
}

/// A named step in a production workflow.
///
/// Stages exist only nested inside a template's `stages` JSON array and have
/// no independent identity or lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Builder-assigned identifier, stable across reorders.
    pub id: String,
    /// Machine code used as the batch's `current_stage` value.
    pub stage_code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_hours: f64,
    #[serde(default)]
    pub required_skills: BTreeSet<String>,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub is_automated: bool,
    #[serde(default)]
    pub auto_assign_rule: AutoAssignRule,
    /// Worker used when `auto_assign_rule` is `specific_worker`.
    #[serde(default)]
    pub specific_worker_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// When a transition is allowed to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCondition {
    AllComplete,
    AnyComplete,
    ManualApproval,
}

/// A directed edge from one stage to its successor(s).
///
/// `to_stage` is a list so stored templates keep their JSON shape, but the
/// generator only ever produces a single successor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    pub from_stage: String,
    pub to_stage: Vec<String>,
    pub condition: TransitionCondition,
    pub auto_transition: bool,
}

/// Build the linear transition chain for an ordered stage list.
///
/// Transition `i` connects `stages[i]` to `stages[i + 1]`, copying
/// `auto_transition` from `stages[i].is_automated`. An empty or single-stage
/// list yields no transitions. The output depends only on the input, so
/// calling this twice on the same stages yields equal lists.
pub fn generate_transitions(stages: &[Stage]) -> Vec<StageTransition> {
    stages
        .windows(2)
        .map(|pair| StageTransition {
            from_stage: pair[0].stage_code.clone(),
            to_stage: vec![pair[1].stage_code.clone()],
            condition: TransitionCondition::AllComplete,
            auto_transition: pair[0].is_automated,
        })
        .collect()
}

/// Return the successor stage codes of `from` in a transition list.
pub fn successors<'a>(transitions: &'a [StageTransition], from: &str) -> &'a [String] {
    transitions
        .iter()
        .find(|t| t.from_stage == from)
        .map(|t| t.to_stage.as_slice())
        .unwrap_or(&[])
}

/// Find a stage by its code.
pub fn find_stage<'a>(stages: &'a [Stage], stage_code: &str) -> Option<&'a Stage> {
    stages.iter().find(|s| s.stage_code == stage_code)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a stage list before it is saved on a template.
///
/// Rejects empty lists, blank or padded codes, blank names, the reserved
/// `pending` code, duplicate codes, negative hour estimates, and
/// `specific_worker` stages with no worker.
pub fn validate_stages(stages: &[Stage]) -> Result<(), CoreError> {
    if stages.is_empty() {
        return Err(CoreError::Validation(
            "A workflow template must have at least one stage".to_string(),
        ));
    }
    if stages.len() > MAX_STAGES_PER_TEMPLATE {
        return Err(CoreError::Validation(format!(
            "A workflow template may have at most {MAX_STAGES_PER_TEMPLATE} stages, got {}",
            stages.len()
        )));
    }

    let mut seen = HashSet::new();
    for (idx, stage) in stages.iter().enumerate() {
        let code = stage.stage_code.trim();
        if code.is_empty() {
            return Err(CoreError::Validation(format!(
                "Stage {} is missing a stage_code",
                idx + 1
            )));
        }
        if code != stage.stage_code {
            return Err(CoreError::Validation(format!(
                "Stage code '{}' has leading or trailing whitespace",
                stage.stage_code
            )));
        }
        if stage.name.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Stage '{code}' is missing a name"
            )));
        }
        if code == PENDING_STAGE {
            return Err(CoreError::Validation(format!(
                "'{PENDING_STAGE}' is reserved and cannot be used as a stage_code"
            )));
        }
        if !seen.insert(code) {
            return Err(CoreError::Validation(format!(
                "Duplicate stage_code '{code}'"
            )));
        }
        if !stage.estimated_hours.is_finite() || stage.estimated_hours < 0.0 {
            return Err(CoreError::Validation(format!(
                "Stage '{code}' has an invalid estimated_hours value"
            )));
        }
        if stage.auto_assign_rule == AutoAssignRule::SpecificWorker
            && stage.specific_worker_id.is_none()
        {
            return Err(CoreError::Validation(format!(
                "Stage '{code}' uses specific_worker assignment but names no worker"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
