//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO for changes

pub mod automation;
pub mod batch;
pub mod event;
pub mod order;
pub mod production;
pub mod repair;
pub mod setting;
pub mod work_task;
pub mod worker;
pub mod workflow_template;
