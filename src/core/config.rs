

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{Result, TenantbaseError};
use crate::{
    ANON_KEY_ENV, DEFAULT_MAX_RETRIES, DEFAULT_SCHEMA, DEFAULT_TIMEOUT_SECS, MAX_RETRIES_ENV,
    SCHEMA_ENV, TIMEOUT_ENV, URL_ENV,
};


#[derive(Clone, Serialize, Deserialize)]
pub struct TenantbaseConfig {
    pub url: String,
    pub anon_key: String,
    pub schema: String,
    pub timeout: u64,
    pub max_retries: u32,
}

impl TenantbaseConfig {

    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            schema: DEFAULT_SCHEMA.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Reads the process environment and validates the result.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| TenantbaseError::Config(format!("{URL_ENV} must be set")))?;
        let anon_key = lookup(ANON_KEY_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| TenantbaseError::Config(format!("{ANON_KEY_ENV} must be set")))?;

        let mut config = Self::new(url.trim(), anon_key.trim());

        if let Some(schema) = lookup(SCHEMA_ENV).filter(|v| !v.trim().is_empty()) {
            config.schema = schema.trim().to_string();
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            config.timeout = raw.trim().parse().map_err(|_| {
                TenantbaseError::Config(format!("{TIMEOUT_ENV} must be a number of seconds, got '{raw}'"))
            })?;
        }
        if let Some(raw) = lookup(MAX_RETRIES_ENV) {
            config.max_retries = raw.trim().parse().map_err(|_| {
                TenantbaseError::Config(format!("{MAX_RETRIES_ENV} must be a whole number, got '{raw}'"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }


    pub fn validate(&self) -> Result<()> {
        if self.anon_key.trim().is_empty() {
            return Err(TenantbaseError::Config("anon key must not be empty".to_string()));
        }
        let parsed = Url::parse(&self.url)
            .map_err(|e| TenantbaseError::Config(format!("invalid service url '{}': {e}", self.url)))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(TenantbaseError::Config(format!(
                "service url '{}' must be an absolute http(s) url",
                self.url
            )));
        }
        if self.schema.trim().is_empty() {
            return Err(TenantbaseError::Config("schema must not be empty".to_string()));
        }
        if self.timeout == 0 {
            return Err(TenantbaseError::Config("timeout must be at least one second".to_string()));
        }
        Ok(())
    }


    pub fn rest_url(&self, table: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}/rest/v1/{}", self.url, table))?)
    }


    pub fn auth_url(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}/auth/v1/{}", self.url, path.trim_start_matches('/')))?)
    }

    pub fn uses_default_schema(&self) -> bool {
        self.schema == DEFAULT_SCHEMA
    }
}

impl std::fmt::Debug for TenantbaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantbaseConfig")
            .field("url", &self.url)
            .field("anon_key", &crate::utils::redact(&self.anon_key))
            .field("schema", &self.schema)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
