//! Tenant-scoped client for a PostgREST/Supabase backend.
//!
//! Every request built through a [`ClientFactory`] forwards the caller's
//! session token, so row-level-security policies on the service decide what
//! the caller can read and change. Deletion is soft: rows get a `deleted_at`
//! timestamp instead of being removed.

pub mod auth;
pub mod core;
pub mod db;
pub mod toolkit;
pub mod utils;


pub use auth::{AuthClient, AuthSession};
pub use crate::core::config::TenantbaseConfig;
pub use crate::core::error::{Result, TenantbaseError};
pub use crate::core::session::{RequestContext, SessionKey, SessionState, SessionToken};
pub use db::{AccessMode, ClientFactory, PostgrestResponse, TenantClient};
pub use toolkit::deletion::{DeletionManager, DeletionOutcome, DeletionResult};
pub use toolkit::records::{ReadScope, RecordStore, TenantRecord};


pub const URL_ENV: &str = "SUPABASE_URL";


pub const ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";

pub const SCHEMA_ENV: &str = "SUPABASE_SCHEMA";

pub const TIMEOUT_ENV: &str = "SUPABASE_TIMEOUT";

pub const MAX_RETRIES_ENV: &str = "SUPABASE_MAX_RETRIES";


pub const DEFAULT_SCHEMA: &str = "public";


pub const DEFAULT_TIMEOUT_SECS: u64 = 30;


pub const DEFAULT_MAX_RETRIES: u32 = 3;


pub const ID_COLUMN: &str = "id";


pub const DELETED_AT_COLUMN: &str = "deleted_at";


pub const CLIENT_INFO: &str = concat!("tenantbase/", env!("CARGO_PKG_VERSION"));
