//! Worker auto-assignment.
//!
//! [`choose_worker`] applies an [`AutoAssignRule`] to a snapshot of worker
//! load. The repository layer builds the snapshot; this module only decides.

use crate::types::DbId;
use crate::workflow::AutoAssignRule;

/// A worker as seen by the assignment rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerLoad {
    pub worker_id: DbId,
    pub skills: Vec<String>,
    pub is_active: bool,
    /// Number of tasks currently pending, assigned or in progress.
    pub open_tasks: i64,
}

impl WorkerLoad {
    fn can_take(&self, required_skill: Option<&str>) -> bool {
        self.is_active
            && required_skill.map_or(true, |skill| self.skills.iter().any(|s| s == skill))
    }
}

/// Inputs to an assignment decision beyond the worker snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignmentContext<'a> {
    /// Skill the worker must have, if any.
    pub required_skill: Option<&'a str>,
    /// Last worker assigned by round robin for this task type.
    pub last_assigned: Option<DbId>,
    /// Worker named by a `specific_worker` rule.
    pub specific_worker_id: Option<DbId>,
}

/// Pick a worker for a task, or `None` if the rule assigns nobody.
///
/// - `least_busy`: eligible worker with the fewest open tasks, lowest id on ties.
/// - `round_robin`: first eligible worker with an id above `last_assigned`,
///   wrapping to the lowest eligible id.
/// - `specific_worker`: the named worker, if eligible.
/// - `manual`: nobody.
///
/// A worker is eligible when active and holding `required_skill`.
pub fn choose_worker(
    rule: AutoAssignRule,
    workers: &[WorkerLoad],
    ctx: AssignmentContext<'_>,
) -> Option<DbId> {
    let mut eligible: Vec<&WorkerLoad> = workers
        .iter()
        .filter(|w| w.can_take(ctx.required_skill))
        .collect();
    eligible.sort_by_key(|w| w.worker_id);

    match rule {
        AutoAssignRule::Manual => None,
        AutoAssignRule::LeastBusy => eligible
            .iter()
            .min_by_key(|w| (w.open_tasks, w.worker_id))
            .map(|w| w.worker_id),
        AutoAssignRule::RoundRobin => {
            let after_last = ctx
                .last_assigned
                .and_then(|last| eligible.iter().find(|w| w.worker_id > last));
            after_last.or(eligible.first()).map(|w| w.worker_id)
        }
        AutoAssignRule::SpecificWorker => ctx
            .specific_worker_id
            .filter(|id| eligible.iter().any(|w| w.worker_id == *id)),
    }
}
