

use thiserror::Error;


#[derive(Error, Debug)]
pub enum TenantbaseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("Remote operation failed ({status}): {message}")]
    Remote {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("No visible row in {table} with id {record_id}")]
    RecordNotVisible { table: String, record_id: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl TenantbaseError {
    /// True when the service rejected the presented credential.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::AuthenticationRequired(_) => true,
            Self::Remote { status, code, .. } => {
                *status == 401 || *status == 403 || code.as_deref() == Some("PGRST301")
            }
            _ => false,
        }
    }

    /// Failures worth retrying for idempotent requests.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }
}


pub type Result<T> = std::result::Result<T, TenantbaseError>;
