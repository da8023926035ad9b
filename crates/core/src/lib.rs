pub mod assignment;
pub mod automation;
pub mod batch;
pub mod board;
pub mod classification;
pub mod error;
pub mod model_cache;
pub mod pagination;
pub mod production;
pub mod repair;
pub mod roles;
pub mod settings;
pub mod specs;
pub mod tasks;
pub mod types;
pub mod workflow;
