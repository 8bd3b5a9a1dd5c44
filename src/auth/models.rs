use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::session::SessionToken;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub refresh_token: String,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthSession {
    pub fn token(&self) -> Result<SessionToken> {
        SessionToken::new(self.access_token.clone())
    }

    /// Absolute expiry; falls back to `issued_at + expires_in` when the
    /// service did not send `expires_at`.
    pub fn expiry(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        self.expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(|| issued_at + Duration::seconds(self.expires_in))
    }

    pub fn is_expired(&self, issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now >= self.expiry(issued_at)
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &crate::utils::redact(&self.access_token))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("refresh_token", &"***")
            .field("user", &self.user)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: Option<i64>) -> AuthSession {
        AuthSession {
            access_token: "eyJhbGciOiJIUzI1NiJ9.payload.signature".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            expires_at,
            refresh_token: "refresh-me".to_string(),
            user: AuthUser {
                id: "user-1".to_string(),
                email: Some("farmer@example.com".to_string()),
                role: Some("authenticated".to_string()),
            },
        }
    }

    #[test]
    fn test_expiry_from_expires_in() {
        let issued = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let s = session(None);
        assert_eq!(s.expiry(issued), issued + Duration::hours(1));
        assert!(!s.is_expired(issued, issued + Duration::minutes(59)));
        assert!(s.is_expired(issued, issued + Duration::minutes(60)));
    }

    #[test]
    fn test_expiry_prefers_expires_at() {
        let issued = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let s = session(Some(issued.timestamp() + 60));
        assert_eq!(s.expiry(issued), issued + Duration::seconds(60));
    }

    #[test]
    fn test_debug_hides_tokens() {
        let printed = format!("{:?}", session(None));
        assert!(!printed.contains("signature"));
        assert!(!printed.contains("refresh-me"));
    }

    #[test]
    fn test_deserialize_without_token_type() {
        let s: AuthSession = serde_json::from_str(
            r#"{"access_token":"a","expires_in":60,"refresh_token":"r","user":{"id":"u"}}"#,
        )
        .unwrap();
        assert_eq!(s.token_type, "bearer");
        assert_eq!(s.token().unwrap().expose(), "a");
    }
}
