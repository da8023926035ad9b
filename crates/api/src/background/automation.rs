//! Automation rule runner.
//!
//! Subscribes to the event bus and, for every batch or task event a rule
//! reacts to, runs the actions of each enabled rule whose trigger matches and
//! whose conditions hold. Every run is logged to `automation_executions`.
//!
//! Actions go through the same batch operations as the HTTP handlers, so the
//! events they publish come back through this runner. Each hop increments the
//! chain depth carried in the payload; events at [`MAX_CHAIN_DEPTH`] are
//! ignored.

use std::sync::Arc;

use shopfloor_core::automation::{
    chain_depth, conditions_hold, trigger_matches, Action, AutomationEvent, EventContext,
    MAX_CHAIN_DEPTH,
};
use shopfloor_core::classification::ProductCategory;
use shopfloor_core::types::DbId;
use shopfloor_db::models::automation::ParsedRule;
use shopfloor_db::repositories::{AutomationRepo, BatchRepo};
use shopfloor_events::{EventBus, PlatformEvent};
use sqlx::PgPool;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::error::AppResult;
use crate::handlers::batches::{apply_transition, change_status};

/// Run the automation loop until `cancel` fires or the bus closes.
pub async fn run(
    pool: PgPool,
    bus: Arc<EventBus>,
    mut receiver: broadcast::Receiver<PlatformEvent>,
    cancel: CancellationToken,
) {
    tracing::info!("Automation runner started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Automation runner stopping");
                break;
            }
            received = receiver.recv() => match received {
                Ok(event) => {
                    if let Err(e) = handle_event(&pool, &bus, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Automation: event handling failed"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Automation runner lagged, events were skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, automation runner stopping");
                    break;
                }
            }
        }
    }
}

/// Evaluate enabled rules against one event. Returns how many rules ran.
///
/// A failing action stops that rule and is recorded as a failed execution;
/// other rules still run.
pub async fn handle_event(pool: &PgPool, bus: &EventBus, event: &PlatformEvent) -> AppResult<usize> {
    let depth = chain_depth(&event.payload);
    if depth >= MAX_CHAIN_DEPTH {
        tracing::debug!(event_type = %event.event_type, depth, "Automation: chain too deep, ignoring");
        return Ok(0);
    }
    let Some(parsed) = AutomationEvent::from_platform(&event.event_type, &event.payload) else {
        return Ok(0);
    };
    let Some(batch_id) = parsed.batch_id() else {
        return Ok(0);
    };

    let rules: Vec<ParsedRule> = AutomationRepo::list_enabled(pool)
        .await?
        .iter()
        .filter_map(|rule| match rule.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(rule_id = rule.id, error = %e, "Automation: skipping malformed rule");
                None
            }
        })
        .filter(|rule| trigger_matches(&rule.trigger, &parsed))
        .collect();
    if rules.is_empty() {
        return Ok(0);
    }

    let Some(ctx) = batch_context(pool, batch_id).await? else {
        tracing::debug!(batch_id, "Automation: batch no longer exists");
        return Ok(0);
    };

    let mut ran = 0;
    for rule in rules.iter().filter(|r| conditions_hold(&r.conditions, &ctx)) {
        let outcome = run_actions(pool, bus, batch_id, &rule.actions, depth + 1).await;
        let error = outcome.err().map(|e| e.to_string());

        match &error {
            None => tracing::info!(rule_id = rule.id, rule = %rule.name, batch_id, "Automation rule executed"),
            Some(e) => tracing::warn!(rule_id = rule.id, rule = %rule.name, batch_id, error = %e, "Automation rule failed"),
        }

        AutomationRepo::record_execution(
            pool,
            rule.id,
            &event.event_type,
            Some(batch_id),
            error.as_deref(),
        )
        .await?;
        ran += 1;
    }
    Ok(ran)
}

/// Facts about the batch for condition checks. The category is set only
/// when every item in the batch shares one.
async fn batch_context(pool: &PgPool, batch_id: DbId) -> AppResult<Option<EventContext>> {
    let Some(batch) = BatchRepo::find_by_id(pool, batch_id).await? else {
        return Ok(None);
    };
    let categories = BatchRepo::item_categories(pool, batch_id).await?;
    let category = match categories.as_slice() {
        [only] => Some(ProductCategory::from_str_lossy(only)),
        _ => None,
    };

    Ok(Some(EventContext {
        batch_type: Some(batch.batch_type),
        workflow_template_id: batch.workflow_template_id,
        category,
    }))
}

async fn run_actions(
    pool: &PgPool,
    bus: &EventBus,
    batch_id: DbId,
    actions: &[Action],
    depth: u64,
) -> AppResult<()> {
    for action in actions {
        match action {
            Action::TransitionBatch { to_stage } => {
                apply_transition(pool, bus, batch_id, Some(to_stage), None, None, depth).await?;
            }
            Action::SetBatchStatus { status } => {
                change_status(pool, bus, batch_id, *status, None, depth).await?;
            }
        }
    }
    Ok(())
}
