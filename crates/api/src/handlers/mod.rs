//! Request handlers, one submodule per resource.
//!
//! Handlers validate input with `shopfloor_core`, delegate persistence to the
//! repositories in `shopfloor_db`, publish platform events after writes
//! commit, and map errors via [`AppError`](crate::error::AppError).

pub mod automation;
pub mod batches;
pub mod orders;
pub mod production;
pub mod repairs;
pub mod settings;
pub mod shopify;
pub mod tasks;
pub mod workers;
pub mod workflows;
