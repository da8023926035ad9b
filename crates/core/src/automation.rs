//! Automation rule model and matching.
//!
//! An automation rule pairs a [`Trigger`] with optional [`Condition`]s and a
//! list of [`Action`]s. All three are closed tagged unions serialized as
//! `{"type": "...", ...}` objects, so a malformed rule is rejected by serde at
//! the API boundary instead of being stored as an arbitrary blob.
//!
//! The runner in the API crate turns platform events into
//! [`AutomationEvent`]s and uses [`trigger_matches`] and [`conditions_hold`]
//! to pick rules to execute.

use serde::{Deserialize, Serialize};

use crate::batch::BatchStatus;
use crate::classification::ProductCategory;
use crate::error::CoreError;
use crate::tasks::TaskType;
use crate::types::DbId;
use crate::workflow::PENDING_STAGE;

/// Platform event names that automation rules can react to.
pub mod event_types {
    pub const BATCH_STAGE_ENTERED: &str = "batch.stage_entered";
    pub const BATCH_COMPLETED: &str = "batch.completed";
    pub const TASK_COMPLETED: &str = "task.completed";
}

/// Payload key holding how many automation hops produced an event.
pub const CHAIN_DEPTH_KEY: &str = "automation_depth";

/// Events this many hops deep no longer trigger rules. Stops rule cycles
/// such as two stages that transition into each other.
pub const MAX_CHAIN_DEPTH: u64 = 3;

/// Automation hops recorded in an event payload; 0 for user actions.
pub fn chain_depth(payload: &serde_json::Value) -> u64 {
    payload
        .get(CHAIN_DEPTH_KEY)
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Rule parts
// ---------------------------------------------------------------------------

/// What starts a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    StageEntered { stage_code: String },
    BatchCompleted,
    TaskCompleted { task_type: TaskType },
}

/// A guard that must hold for a triggered rule to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    BatchTypeIs { batch_type: String },
    WorkflowIs { workflow_template_id: DbId },
    CategoryIs { category: ProductCategory },
}

/// What a rule does to the batch the event concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    TransitionBatch { to_stage: String },
    SetBatchStatus { status: BatchStatus },
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A platform event in the shape automation cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomationEvent {
    StageEntered { batch_id: DbId, stage_code: String },
    BatchCompleted { batch_id: DbId },
    /// `batch_id` is `None` when the task's item is not in any batch.
    TaskCompleted { task_id: DbId, task_type: TaskType, batch_id: Option<DbId> },
}

impl AutomationEvent {
    /// Build an automation event from a platform event name and payload.
    ///
    /// Returns `None` for event names automation ignores or payloads missing
    /// required fields.
    pub fn from_platform(event_type: &str, payload: &serde_json::Value) -> Option<Self> {
        let id = |key: &str| payload.get(key).and_then(serde_json::Value::as_i64);
        let text = |key: &str| payload.get(key).and_then(serde_json::Value::as_str);

        match event_type {
            event_types::BATCH_STAGE_ENTERED => Some(Self::StageEntered {
                batch_id: id("batch_id")?,
                stage_code: text("stage_code")?.to_string(),
            }),
            event_types::BATCH_COMPLETED => Some(Self::BatchCompleted {
                batch_id: id("batch_id")?,
            }),
            event_types::TASK_COMPLETED => Some(Self::TaskCompleted {
                task_id: id("task_id")?,
                task_type: TaskType::parse(text("task_type")?).ok()?,
                batch_id: id("batch_id"),
            }),
            _ => None,
        }
    }

    /// The batch an action should apply to, if the event concerns one.
    pub fn batch_id(&self) -> Option<DbId> {
        match self {
            Self::StageEntered { batch_id, .. } | Self::BatchCompleted { batch_id } => {
                Some(*batch_id)
            }
            Self::TaskCompleted { batch_id, .. } => *batch_id,
        }
    }
}

/// Facts about the event's subject used to evaluate conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventContext {
    pub batch_type: Option<String>,
    pub workflow_template_id: Option<DbId>,
    pub category: Option<ProductCategory>,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Whether a trigger fires for an event.
pub fn trigger_matches(trigger: &Trigger, event: &AutomationEvent) -> bool {
    match (trigger, event) {
        (Trigger::StageEntered { stage_code }, AutomationEvent::StageEntered { stage_code: s, .. }) => {
            stage_code == s
        }
        (Trigger::BatchCompleted, AutomationEvent::BatchCompleted { .. }) => true,
        (Trigger::TaskCompleted { task_type }, AutomationEvent::TaskCompleted { task_type: t, .. }) => {
            task_type == t
        }
        _ => false,
    }
}

/// Whether every condition holds. An empty condition list always holds;
/// a condition on a fact the context lacks never holds.
pub fn conditions_hold(conditions: &[Condition], ctx: &EventContext) -> bool {
    conditions.iter().all(|c| match c {
        Condition::BatchTypeIs { batch_type } => ctx.batch_type.as_deref() == Some(batch_type.as_str()),
        Condition::WorkflowIs {
            workflow_template_id,
        } => ctx.workflow_template_id == Some(*workflow_template_id),
        Condition::CategoryIs { category } => ctx.category == Some(*category),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a rule before it is stored.
///
/// A rule needs a name and at least one action. Transition actions must name
/// a real stage (not blank and not `pending`).
pub fn validate_rule(name: &str, trigger: &Trigger, actions: &[Action]) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Rule name is required".to_string()));
    }
    if actions.is_empty() {
        return Err(CoreError::Validation(
            "A rule must have at least one action".to_string(),
        ));
    }
    if let Trigger::StageEntered { stage_code } = trigger {
        if stage_code.trim().is_empty() {
            return Err(CoreError::Validation(
                "stage_entered trigger requires a stage_code".to_string(),
            ));
        }
    }
    for action in actions {
        if let Action::TransitionBatch { to_stage } = action {
            let code = to_stage.trim();
            if code.is_empty() || code == PENDING_STAGE {
                return Err(CoreError::Validation(
                    "transition_batch must target a workflow stage".to_string(),
                ));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_deserializes_from_tagged_json() {
        let t: Trigger =
            serde_json::from_value(serde_json::json!({"type": "stage_entered", "stage_code": "qc"}))
                .unwrap();
        assert_eq!(t, Trigger::StageEntered { stage_code: "qc".into() });
    }

    #[test]
    fn unknown_trigger_shape_is_rejected() {
        let res: Result<Trigger, _> =
            serde_json::from_value(serde_json::json!({"type": "cron", "every": "5m"}));
        assert!(res.is_err());
    }

    #[test]
    fn stage_trigger_matches_only_its_stage() {
        let t = Trigger::StageEntered { stage_code: "qc".into() };
        let hit = AutomationEvent::StageEntered { batch_id: 1, stage_code: "qc".into() };
        let miss = AutomationEvent::StageEntered { batch_id: 1, stage_code: "sanding".into() };
        assert!(trigger_matches(&t, &hit));
        assert!(!trigger_matches(&t, &miss));
        assert!(!trigger_matches(&t, &AutomationEvent::BatchCompleted { batch_id: 1 }));
    }

    #[test]
    fn conditions_all_must_hold() {
        let ctx = EventContext {
            batch_type: Some("standard".into()),
            workflow_template_id: Some(3),
            category: None,
        };
        assert!(conditions_hold(&[], &ctx));
        assert!(conditions_hold(
            &[
                Condition::BatchTypeIs { batch_type: "standard".into() },
                Condition::WorkflowIs { workflow_template_id: 3 },
            ],
            &ctx
        ));
        assert!(!conditions_hold(
            &[Condition::CategoryIs { category: ProductCategory::Headphone }],
            &ctx
        ));
    }

    #[test]
    fn platform_event_parsing() {
        let ev = AutomationEvent::from_platform(
            event_types::TASK_COMPLETED,
            &serde_json::json!({"task_id": 9, "task_type": "qc", "batch_id": 4}),
        )
        .unwrap();
        assert_eq!(ev.batch_id(), Some(4));
        assert!(AutomationEvent::from_platform("batch.deleted", &serde_json::json!({})).is_none());
        assert!(
            AutomationEvent::from_platform(event_types::BATCH_COMPLETED, &serde_json::json!({}))
                .is_none()
        );
    }

    #[test]
    fn transition_to_pending_rejected() {
        let err = validate_rule(
            "send back",
            &Trigger::BatchCompleted,
            &[Action::TransitionBatch { to_stage: "pending".into() }],
        )
        .unwrap_err();
        assert!(err.to_string().contains("workflow stage"));
    }

    #[test]
    fn blank_stage_trigger_rejected() {
        let err = validate_rule(
            "hold",
            &Trigger::StageEntered { stage_code: " ".into() },
            &[Action::SetBatchStatus { status: BatchStatus::OnHold }],
        )
        .unwrap_err();
        assert!(err.to_string().contains("requires a stage_code"));
    }

    #[test]
    fn valid_rule_passes() {
        assert!(validate_rule(
            "auto advance",
            &Trigger::StageEntered { stage_code: "finishing".into() },
            &[Action::TransitionBatch { to_stage: "assembly".into() }],
        )
        .is_ok());
    }

    #[test]
    fn empty_actions_rejected() {
        assert!(validate_rule("noop", &Trigger::BatchCompleted, &[]).is_err());
    }

    #[test]
    fn chain_depth_defaults_to_zero() {
        assert_eq!(chain_depth(&serde_json::json!({"batch_id": 1})), 0);
        assert_eq!(chain_depth(&serde_json::json!({"automation_depth": 2})), 2);
    }
}
