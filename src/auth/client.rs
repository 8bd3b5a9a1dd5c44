

use std::sync::Arc;

use reqwest::{
    header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, Request,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use super::models::AuthSession;
use crate::core::config::TenantbaseConfig;
use crate::core::error::{Result, TenantbaseError};
use crate::core::session::SessionToken;
use crate::db::response::remote_error;
use crate::db::{ClientFactory, Transport};
use crate::utils::require_non_empty;
use crate::CLIENT_INFO;

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}


/// Talks to the service's auth endpoint to obtain and revoke session tokens.
pub struct AuthClient {
    config: TenantbaseConfig,
    transport: Arc<dyn Transport>,
}

impl AuthClient {
    pub fn new(factory: &ClientFactory) -> Self {
        Self {
            config: factory.config().clone(),
            transport: factory.transport(),
        }
    }


    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        require_non_empty("email", email)?;
        require_non_empty("password", password)?;
        debug!("Signing in {}", email);

        let url = self.token_url("password")?;
        let body = serde_json::to_value(PasswordGrant { email, password })?;
        let session = self.exchange(url, &body).await?;
        info!("Signed in user {}", session.user.id);
        Ok(session)
    }


    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession> {
        require_non_empty("refresh token", refresh_token)?;
        let url = self.token_url("refresh_token")?;
        let body = serde_json::to_value(RefreshGrant { refresh_token })?;
        let session = self.exchange(url, &body).await?;
        debug!("Refreshed session for user {}", session.user.id);
        Ok(session)
    }

    /// Revokes `token` on the service. The caller still has to clear its session slot.
    pub async fn sign_out(&self, token: &SessionToken) -> Result<()> {
        let url = self.config.auth_url("logout")?;
        let request = self.request(url, Some(token), None)?;
        let raw = self.transport.send(request).await?;
        if !raw.is_success() {
            let err = remote_error(&raw);
            warn!("Sign-out failed: {}", err);
            return Err(err);
        }
        info!("Signed out");
        Ok(())
    }

    fn token_url(&self, grant_type: &str) -> Result<Url> {
        let mut url = self.config.auth_url("token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        Ok(url)
    }

    async fn exchange(&self, url: Url, body: &serde_json::Value) -> Result<AuthSession> {
        let request = self.request(url, None, Some(body))?;
        let raw = self.transport.send(request).await?;
        if !raw.is_success() {
            return Err(remote_error(&raw));
        }
        Ok(serde_json::from_str(&raw.body)?)
    }

    fn request(
        &self,
        url: Url,
        token: Option<&SessionToken>,
        body: Option<&serde_json::Value>,
    ) -> Result<Request> {
        let mut request = Request::new(Method::POST, url);
        let headers = request.headers_mut();
        headers.insert("apikey", to_header(&self.config.anon_key)?);
        let bearer = token.map(SessionToken::expose).unwrap_or(&self.config.anon_key);
        let mut authorization = to_header(&format!("Bearer {bearer}"))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert("x-client-info", HeaderValue::from_static(CLIENT_INFO));
        if let Some(body) = body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *request.body_mut() = Some(serde_json::to_vec(body)?.into());
        }
        Ok(request)
    }
}

fn to_header(raw: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(raw).map_err(|_| {
        TenantbaseError::InvalidArgument("credential contains invalid header characters".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::transport::testing::RecordingTransport;
    use crate::db::RawResponse;
    use serde_json::json;

    const SESSION_BODY: &str = r#"{
        "access_token": "user-jwt",
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": 1780000000,
        "refresh_token": "refresh-1",
        "user": {"id": "user-1", "email": "farmer@example.com", "role": "authenticated"}
    }"#;

    fn auth_with(transport: Arc<RecordingTransport>) -> AuthClient {
        let config = TenantbaseConfig::new("https://project.supabase.co", "anon-key");
        let factory = ClientFactory::with_transport(config, transport).unwrap();
        AuthClient::new(&factory)
    }

    #[tokio::test]
    async fn test_password_sign_in() {
        let transport = Arc::new(RecordingTransport::new());
        transport.reply(RawResponse::new(200, SESSION_BODY));
        let auth = auth_with(Arc::clone(&transport));

        let session = auth.sign_in_with_password("farmer@example.com", "hunter2").await.unwrap();
        assert_eq!(session.access_token, "user-jwt");
        assert_eq!(session.user.email.as_deref(), Some("farmer@example.com"));

        let request = transport.last();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url.path(), "/auth/v1/token");
        assert_eq!(request.url.query(), Some("grant_type=password"));
        assert_eq!(request.header("apikey"), Some("anon-key"));
        assert_eq!(request.header("authorization"), Some("Bearer anon-key"));
        assert_eq!(
            request.body,
            Some(json!({"email": "farmer@example.com", "password": "hunter2"}))
        );
    }

    #[tokio::test]
    async fn test_bad_credentials_surface_remote_error() {
        let transport = Arc::new(RecordingTransport::new());
        transport.reply(RawResponse::new(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        ));
        let auth = auth_with(transport);

        let err = auth.sign_in_with_password("farmer@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, TenantbaseError::Remote { status: 400, .. }));
        assert!(err.to_string().contains("Invalid login credentials"));
    }

    #[tokio::test]
    async fn test_blank_credentials_rejected_locally() {
        let transport = Arc::new(RecordingTransport::new());
        let auth = auth_with(Arc::clone(&transport));
        let err = auth.sign_in_with_password("", "pw").await.unwrap_err();
        assert!(matches!(err, TenantbaseError::InvalidArgument(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_grant() {
        let transport = Arc::new(RecordingTransport::new());
        transport.reply(RawResponse::new(200, SESSION_BODY));
        let auth = auth_with(Arc::clone(&transport));

        auth.refresh("refresh-1").await.unwrap();
        let request = transport.last();
        assert_eq!(request.url.query(), Some("grant_type=refresh_token"));
        assert_eq!(request.body, Some(json!({"refresh_token": "refresh-1"})));
    }

    #[tokio::test]
    async fn test_sign_out_sends_user_token() {
        let transport = Arc::new(RecordingTransport::new());
        transport.reply(RawResponse::new(204, ""));
        let auth = auth_with(Arc::clone(&transport));

        auth.sign_out(&SessionToken::new("user-jwt").unwrap()).await.unwrap();
        let request = transport.last();
        assert_eq!(request.url.path(), "/auth/v1/logout");
        assert_eq!(request.header("authorization"), Some("Bearer user-jwt"));
        assert!(request.body.is_none());
    }
}
