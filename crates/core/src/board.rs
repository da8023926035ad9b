//! Flow board column bucketing.
//!
//! The board shows one column for pending batches followed by one column per
//! template stage, in template order. Batches whose `current_stage` is not a
//! stage of the template are collected in a trailing `unknown` column rather
//! than dropped.

use serde::Serialize;

use crate::workflow::{Stage, PENDING_STAGE};

/// Column code for batches whose stage is missing from the template.
pub const UNKNOWN_STAGE: &str = "unknown";

/// A single board column with the items bucketed into it.
#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn<T> {
    pub stage_code: String,
    pub name: String,
    pub items: Vec<T>,
}

/// Bucket `items` into board columns for the given stage list.
///
/// `stage_of` returns an item's current stage (`None` for pending). Item
/// order within a column follows input order. The `unknown` column is only
/// present when at least one item lands in it.
pub fn build_board<T, F>(stages: &[Stage], items: Vec<T>, stage_of: F) -> Vec<BoardColumn<T>>
where
    F: Fn(&T) -> Option<&str>,
{
    let mut columns: Vec<BoardColumn<T>> = Vec::with_capacity(stages.len() + 2);
    columns.push(BoardColumn {
        stage_code: PENDING_STAGE.to_string(),
        name: "Pending".to_string(),
        items: Vec::new(),
    });
    for stage in stages {
        columns.push(BoardColumn {
            stage_code: stage.stage_code.clone(),
            name: stage.name.clone(),
            items: Vec::new(),
        });
    }

    let mut unknown = Vec::new();
    for item in items {
        let idx = match stage_of(&item) {
            None => Some(0),
            Some(code) => columns.iter().position(|c| c.stage_code == code),
        };
        match idx {
            Some(i) => columns[i].items.push(item),
            None => unknown.push(item),
        }
    }

    if !unknown.is_empty() {
        columns.push(BoardColumn {
            stage_code: UNKNOWN_STAGE.to_string(),
            name: "Unknown stage".to_string(),
            items: unknown,
        });
    }
    columns
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::workflow::AutoAssignRule;

    fn stage(code: &str) -> Stage {
        Stage {
            id: code.to_string(),
            stage_code: code.to_string(),
            name: code.to_uppercase(),
            description: None,
            estimated_hours: 0.0,
            required_skills: BTreeSet::new(),
            is_optional: false,
            is_automated: false,
            auto_assign_rule: AutoAssignRule::Manual,
            specific_worker_id: None,
        }
    }

    #[test]
    fn columns_follow_template_order_after_pending() {
        let board = build_board::<(i64, Option<&str>), _>(
            &[stage("sanding"), stage("qc")],
            vec![],
            |b| b.1,
        );
        let codes: Vec<_> = board.iter().map(|c| c.stage_code.as_str()).collect();
        assert_eq!(codes, vec!["pending", "sanding", "qc"]);
    }

    #[test]
    fn batches_land_in_their_stage_column() {
        let items = vec![(1, None), (2, Some("qc")), (3, Some("sanding")), (4, Some("qc"))];
        let board = build_board(&[stage("sanding"), stage("qc")], items, |b| b.1);

        assert_eq!(board[0].items.iter().map(|b| b.0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(board[1].items.iter().map(|b| b.0).collect::<Vec<_>>(), vec![3]);
        assert_eq!(board[2].items.iter().map(|b| b.0).collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(board.len(), 3);
    }

    #[test]
    fn stray_stage_goes_to_unknown_column() {
        let items = vec![(1, Some("removed_stage"))];
        let board = build_board(&[stage("sanding")], items, |b| b.1);

        let last = board.last().unwrap();
        assert_eq!(last.stage_code, UNKNOWN_STAGE);
        assert_eq!(last.items.len(), 1);
    }
}
