//! Event names. Each must have a row in `event_types`
//! (`20260301000010_create_events.sql`) or persistence drops it.

pub use shopfloor_core::automation::event_types::{
    BATCH_COMPLETED, BATCH_STAGE_ENTERED, TASK_COMPLETED,
};

pub const BATCH_CREATED: &str = "batch.created";
pub const BATCH_STATUS_CHANGED: &str = "batch.status_changed";
pub const TASK_ASSIGNED: &str = "task.assigned";
pub const TASK_QC_FAILED: &str = "task.qc_failed";
pub const ORDER_SYNCED: &str = "order.synced";
pub const ORDER_ITEM_IMPORTED: &str = "order_item.imported";
pub const PRODUCTION_LOGGED: &str = "production.logged";
pub const REPAIR_STATUS_CHANGED: &str = "repair.status_changed";
