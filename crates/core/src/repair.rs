//! Repair intake status flow.
//!
//! ```text
//! received -> diagnosing -> awaiting_approval -> in_repair -> testing -> ready_to_ship -> shipped
//!                                                    ^            |
//!                                                    +------------+
//! ```
//!
//! Any non-terminal status may also move to `cancelled`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Valid priority values for `repairs.priority`.
pub const VALID_PRIORITIES: &[&str] = &["low", "normal", "high", "urgent"];

/// Priority used when a repair is created without one.
pub const DEFAULT_PRIORITY: &str = "normal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    Received,
    Diagnosing,
    AwaitingApproval,
    InRepair,
    Testing,
    ReadyToShip,
    Shipped,
    Cancelled,
}

impl RepairStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Diagnosing => "diagnosing",
            Self::AwaitingApproval => "awaiting_approval",
            Self::InRepair => "in_repair",
            Self::Testing => "testing",
            Self::ReadyToShip => "ready_to_ship",
            Self::Shipped => "shipped",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "received" => Ok(Self::Received),
            "diagnosing" => Ok(Self::Diagnosing),
            "awaiting_approval" => Ok(Self::AwaitingApproval),
            "in_repair" => Ok(Self::InRepair),
            "testing" => Ok(Self::Testing),
            "ready_to_ship" => Ok(Self::ReadyToShip),
            "shipped" => Ok(Self::Shipped),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Unknown repair status: '{other}'"
            ))),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Shipped | Self::Cancelled)
    }

    /// Whether `self -> to` is a legal move.
    pub fn can_transition(self, to: RepairStatus) -> bool {
        use RepairStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, to),
            (_, Cancelled)
                | (Received, Diagnosing)
                | (Diagnosing, AwaitingApproval)
                | (AwaitingApproval, InRepair)
                | (InRepair, Testing)
                | (Testing, InRepair)
                | (Testing, ReadyToShip)
                | (ReadyToShip, Shipped)
        )
    }
}

impl std::fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a status change, returning `Conflict` for an illegal move.
pub fn validate_repair_transition(from: RepairStatus, to: RepairStatus) -> Result<(), CoreError> {
    if from.can_transition(to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Cannot move repair from '{from}' to '{to}'"
        )))
    }
}

pub fn validate_priority(priority: &str) -> Result<(), CoreError> {
    if VALID_PRIORITIES.contains(&priority) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid priority '{priority}'. Must be one of: {}",
            VALID_PRIORITIES.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RepairStatus::*;

    #[test]
    fn happy_path_is_allowed() {
        let path = [
            Received,
            Diagnosing,
            AwaitingApproval,
            InRepair,
            Testing,
            ReadyToShip,
            Shipped,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn testing_can_return_to_repair() {
        assert!(Testing.can_transition(InRepair));
        assert!(!ReadyToShip.can_transition(InRepair));
    }

    #[test]
    fn skipping_steps_is_rejected() {
        let err = validate_repair_transition(Received, InRepair).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn cancel_from_any_open_state() {
        for s in [Received, Diagnosing, AwaitingApproval, InRepair, Testing, ReadyToShip] {
            assert!(s.can_transition(Cancelled));
        }
        assert!(!Shipped.can_transition(Cancelled));
        assert!(!Cancelled.can_transition(Received));
    }

    #[test]
    fn priority_validation() {
        assert!(validate_priority("urgent").is_ok());
        assert!(validate_priority("asap").is_err());
    }
}
