pub mod models;
pub mod store;

pub use models::{parse_timestamp, Liveness, ReadScope, TenantRecord};
pub use store::RecordStore;
