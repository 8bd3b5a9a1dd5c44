pub mod config;
pub mod error;
pub mod session;

pub use config::TenantbaseConfig;
pub use error::{Result, TenantbaseError};
pub use session::{RequestContext, SessionKey, SessionState, SessionToken};
