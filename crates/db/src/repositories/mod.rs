//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod automation_repo;
pub mod batch_repo;
pub mod event_repo;
pub mod order_repo;
pub mod production_repo;
pub mod repair_repo;
pub mod setting_repo;
pub mod work_task_repo;
pub mod worker_repo;
pub mod workflow_template_repo;

pub use automation_repo::AutomationRepo;
pub use batch_repo::BatchRepo;
pub use event_repo::EventRepo;
pub use order_repo::OrderRepo;
pub use production_repo::ProductionRepo;
pub use repair_repo::RepairRepo;
pub use setting_repo::SettingRepo;
pub use work_task_repo::WorkTaskRepo;
pub use worker_repo::WorkerRepo;
pub use workflow_template_repo::WorkflowTemplateRepo;
