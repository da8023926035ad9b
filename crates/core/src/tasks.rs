//! Work task types, statuses, and the required-task lookup.
//!
//! When an order item is imported, [`derive_required_tasks`] decides which
//! `work_tasks` rows to create for it. Task status changes are checked by
//! [`validate_task_transition`].

use serde::{Deserialize, Serialize};

use crate::classification::ProductCategory;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Task type
// ---------------------------------------------------------------------------

/// Kind of production work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Sanding,
    Finishing,
    CustomWork,
    Assembly,
    Qc,
    Packaging,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sanding => "sanding",
            Self::Finishing => "finishing",
            Self::CustomWork => "custom_work",
            Self::Assembly => "assembly",
            Self::Qc => "qc",
            Self::Packaging => "packaging",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "sanding" => Ok(Self::Sanding),
            "finishing" => Ok(Self::Finishing),
            "custom_work" => Ok(Self::CustomWork),
            "assembly" => Ok(Self::Assembly),
            "qc" => Ok(Self::Qc),
            "packaging" => Ok(Self::Packaging),
            other => Err(CoreError::Validation(format!("Unknown task type: '{other}'"))),
        }
    }

    /// Skill a worker needs to be auto-assigned this task.
    pub fn required_skill(self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Required tasks
// ---------------------------------------------------------------------------

/// Ordered task list for a category.
///
/// | category    | tasks                                   |
/// |-------------|-----------------------------------------|
/// | headphone   | sanding, assembly, qc, packaging        |
/// | electronics | assembly, qc, packaging                 |
/// | accessory   | qc, packaging                           |
/// | component   | qc                                      |
/// | other       | packaging                               |
///
/// Custom work inserts `custom_work` before `assembly` for headphones.
pub fn required_tasks_for(category: ProductCategory, has_custom_work: bool) -> Vec<TaskType> {
    use TaskType::*;
    match category {
        ProductCategory::Headphone if has_custom_work => {
            vec![Sanding, CustomWork, Assembly, Qc, Packaging]
        }
        ProductCategory::Headphone => vec![Sanding, Assembly, Qc, Packaging],
        ProductCategory::Electronics => vec![Assembly, Qc, Packaging],
        ProductCategory::Accessory => vec![Qc, Packaging],
        ProductCategory::Component => vec![Qc],
        ProductCategory::Other => vec![Packaging],
    }
}

/// Ordered task list for a stored category string.
///
/// Unknown category strings fall back to the `other` list.
pub fn derive_required_tasks(category: &str, has_custom_work: bool) -> Vec<TaskType> {
    required_tasks_for(ProductCategory::from_str_lossy(category), has_custom_work)
}

// ---------------------------------------------------------------------------
// Task status
// ---------------------------------------------------------------------------

/// Lifecycle status of a work task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    QcFailed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::QcFailed => "qc_failed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "qc_failed" => Ok(Self::QcFailed),
            other => Err(CoreError::Validation(format!("Unknown task status: '{other}'"))),
        }
    }

    /// Whether the task still counts towards a worker's open load.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Assigned | Self::InProgress)
    }
}

/// Check that a task may move from `from` to `to`.
///
/// `pending -> assigned -> in_progress -> completed`; assigned tasks may be
/// reassigned and completed directly; QC tasks may end in `qc_failed`;
/// completed tasks can only be reopened to `pending` (when QC fails
/// downstream).
pub fn validate_task_transition(
    task_type: TaskType,
    from: TaskStatus,
    to: TaskStatus,
) -> Result<(), CoreError> {
    use TaskStatus::*;
    let allowed = match (from, to) {
        (Pending, Assigned) | (Assigned, Assigned) => true,
        (Assigned, InProgress) => true,
        (Assigned, Completed) | (InProgress, Completed) => true,
        (Assigned, QcFailed) | (InProgress, QcFailed) => task_type == TaskType::Qc,
        (Completed, Pending) | (QcFailed, Pending) => true,
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Cannot move {} task from '{}' to '{}'",
            task_type.as_str(),
            from.as_str(),
            to.as_str()
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
