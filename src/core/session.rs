//! Session tokens and the explicit per-request context.
//!
//! Nothing here reads ambient global state: callers hold a [`SessionState`],
//! pick the slot name themselves through [`SessionKey`], and hand a
//! [`RequestContext`] to every operation.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::error::{Result, TenantbaseError};
use crate::auth::AuthSession;
use crate::utils::redact;


/// Opaque bearer credential. Never parsed, never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TenantbaseError::InvalidArgument(
                "session token must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({})", redact(&self.0))
    }
}


/// Name of the session slot holding the token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TenantbaseError::InvalidArgument(
                "session key must not be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}


#[derive(Default)]
pub struct SessionState {
    tokens: RwLock<HashMap<SessionKey, SessionToken>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &SessionKey, token: SessionToken) {
        debug!("Storing session token under '{}'", key.as_str());
        self.tokens.write().insert(key.clone(), token);
    }

    /// Stores the access token of a freshly signed-in session.
    pub fn store_session(&self, key: &SessionKey, session: &AuthSession) -> Result<()> {
        let token = SessionToken::new(session.access_token.clone())?;
        self.insert(key, token);
        Ok(())
    }

    pub fn get(&self, key: &SessionKey) -> Option<SessionToken> {
        self.tokens.read().get(key).cloned()
    }

    /// Discards the token at logout or session end.
    pub fn clear(&self, key: &SessionKey) -> Option<SessionToken> {
        debug!("Clearing session token under '{}'", key.as_str());
        self.tokens.write().remove(key)
    }

    pub fn context(&self, key: &SessionKey) -> RequestContext {
        match self.get(key) {
            Some(token) => RequestContext::authenticated(token),
            None => RequestContext::anonymous(),
        }
    }
}


#[derive(Debug, Clone)]
pub struct RequestContext {
    token: Option<SessionToken>,
    request_id: String,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self {
            token: None,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn authenticated(token: SessionToken) -> Self {
        Self {
            token: Some(token),
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn require_token(&self) -> Result<&SessionToken> {
        self.token.as_ref().ok_or_else(|| {
            TenantbaseError::AuthenticationRequired(
                "this operation needs a signed-in session".to_string(),
            )
        })
    }
}
