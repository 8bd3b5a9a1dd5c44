pub mod manager;
pub mod models;
pub mod soft;


pub use manager::DeletionManager;
pub use models::{DeletionAction, DeletionOutcome, DeletionResult};
pub use soft::{restore, soft_delete, soft_delete_payload};
