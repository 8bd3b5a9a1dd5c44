pub mod deletion;
pub mod records;

pub use deletion::{DeletionAction, DeletionManager, DeletionOutcome, DeletionResult};
pub use records::{Liveness, ReadScope, RecordStore, TenantRecord};
