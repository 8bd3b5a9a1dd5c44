

use std::sync::Arc;
use std::time::Duration;

use reqwest::{
    header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, Request,
};
use serde_json::Value;
use strum::{Display, IntoStaticStr};
use tracing::{debug, error, info, warn};
use url::Url;

use super::query::QueryBuilder;
use super::response::PostgrestResponse;
use super::transport::{ReqwestTransport, Transport};
use crate::core::config::TenantbaseConfig;
use crate::core::error::{Result, TenantbaseError};
use crate::core::session::{RequestContext, SessionToken};
use crate::utils::{redact, validate_identifier};
use crate::CLIENT_INFO;


const INITIAL_RETRY_DELAY_MS: u64 = 100;

const MAX_RETRY_DELAY_MS: u64 = 10000;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AccessMode {
    /// A session token is forwarded; policies see the caller's claims.
    Authenticated,
    /// Only the anon key is sent. Treat returned data as public.
    Public,
}


/// Builds tenant-scoped clients that share one configuration and connection pool.
#[derive(Clone)]
pub struct ClientFactory {
    config: Arc<TenantbaseConfig>,
    transport: Arc<dyn Transport>,
}

impl ClientFactory {

    pub fn new(config: TenantbaseConfig) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        Self::with_transport(config, transport)
    }


    pub fn from_env() -> Result<Self> {
        Self::new(TenantbaseConfig::from_env()?)
    }


    pub fn with_transport(config: TenantbaseConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        info!(
            "Client factory ready for {} (schema={}, timeout={}s)",
            config.url, config.schema, config.timeout
        );
        Ok(Self {
            config: Arc::new(config),
            transport,
        })
    }

    /// A client that forwards `token` on every request, or a public one without it.
    pub fn client(&self, token: Option<&SessionToken>) -> TenantClient {
        let ctx = match token {
            Some(token) => RequestContext::authenticated(token.clone()),
            None => RequestContext::anonymous(),
        };
        self.for_context(&ctx)
    }


    pub fn for_context(&self, ctx: &RequestContext) -> TenantClient {
        let mode = if ctx.is_authenticated() {
            AccessMode::Authenticated
        } else {
            AccessMode::Public
        };
        match ctx.token() {
            Some(token) => debug!(
                "Creating {} client (token={}, request={})",
                mode,
                redact(token.expose()),
                ctx.request_id()
            ),
            None => debug!("Creating {} client (request={})", mode, ctx.request_id()),
        }
        TenantClient {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
            token: ctx.token().cloned(),
            request_id: ctx.request_id().to_string(),
            mode,
        }
    }

    /// Like [`for_context`](Self::for_context) but refuses contexts without a token.
    pub fn authenticated(&self, ctx: &RequestContext) -> Result<TenantClient> {
        ctx.require_token()?;
        Ok(self.for_context(ctx))
    }

    pub fn config(&self) -> &TenantbaseConfig {
        &self.config
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }
}


pub struct TenantClient {
    config: Arc<TenantbaseConfig>,
    transport: Arc<dyn Transport>,
    token: Option<SessionToken>,
    request_id: String,
    mode: AccessMode,
}

impl TenantClient {
    pub fn access_mode(&self) -> AccessMode {
        self.mode
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Starts a query against `table`.
    pub fn table(&self, table: &str) -> Result<QueryBuilder<'_>> {
        validate_identifier("table", table)?;
        Ok(QueryBuilder::new(self, table))
    }

    pub(crate) fn rest_url(&self, table: &str) -> Result<Url> {
        self.config.rest_url(table)
    }

    /// Attaches credentials, profile and tracing headers to a new request.
    pub(crate) fn build_request(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        prefer: &[&str],
    ) -> Result<Request> {
        let read_only = matches!(method, Method::GET | Method::HEAD);
        let mut request = Request::new(method, url);
        let headers = request.headers_mut();

        headers.insert("apikey", header_value(&self.config.anon_key)?);
        let bearer = match &self.token {
            Some(token) => token.expose(),
            None => self.config.anon_key.as_str(),
        };
        let mut authorization = header_value(&format!("Bearer {bearer}"))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert("x-client-info", HeaderValue::from_static(CLIENT_INFO));
        headers.insert("x-request-id", header_value(&self.request_id)?);

        if !self.config.uses_default_schema() {
            let profile = if read_only { "accept-profile" } else { "content-profile" };
            headers.insert(profile, header_value(&self.config.schema)?);
        }
        if !prefer.is_empty() {
            headers.insert("prefer", header_value(&prefer.join(","))?);
        }
        if let Some(body) = body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *request.body_mut() = Some(serde_json::to_vec(body)?.into());
        }
        Ok(request)
    }

    /// Sends `request`. Reads are retried on transient failures, writes go out once.
    pub async fn execute(&self, request: Request) -> Result<PostgrestResponse> {
        let idempotent = matches!(*request.method(), Method::GET | Method::HEAD);
        let attempts = if idempotent { self.config.max_retries.saturating_add(1) } else { 1 };
        let method = request.method().clone();
        let path = request.url().path().to_string();
        let mut delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS);
        let mut request = request;
        let mut attempt = 1;

        loop {
            let retry = if attempt < attempts { request.try_clone() } else { None };
            debug!(
                "{} {} (attempt {}, mode={}, request={})",
                method, path, attempt, self.mode, self.request_id
            );

            let outcome = match self.transport.send(request).await {
                Ok(raw) => PostgrestResponse::from_raw(raw),
                Err(e) => Err(e),
            };

            match (outcome, retry) {
                (Ok(response), _) => {
                    debug!("{} {} -> {}", method, path, response.status);
                    return Ok(response);
                }
                (Err(e), Some(next)) if e.is_transient() => {
                    warn!("{} {} failed (attempt {}), retrying: {}", method, path, attempt, e);
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_millis(MAX_RETRY_DELAY_MS));
                    request = next;
                    attempt += 1;
                }
                (Err(e), _) => {
                    if e.is_auth_failure() {
                        warn!("{} {} rejected credentials: {}", method, path, e);
                    } else {
                        error!("{} {} failed: {}", method, path, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}

fn header_value(raw: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(raw).map_err(|_| {
        TenantbaseError::InvalidArgument("header value contains invalid characters".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::transport::testing::RecordingTransport;
    use crate::db::transport::RawResponse;
    use serde_json::json;

    fn factory_with(transport: Arc<RecordingTransport>) -> ClientFactory {
        let config = TenantbaseConfig::new("https://project.supabase.co", "anon-key");
        ClientFactory::with_transport(config, transport).unwrap()
    }

    #[test]
    fn test_factory_rejects_invalid_config() {
        let config = TenantbaseConfig::new("not a url", "anon-key");
        assert!(matches!(
            ClientFactory::new(config),
            Err(TenantbaseError::Config(_))
        ));
    }

    #[test]
    fn test_access_mode_follows_token() {
        let factory = factory_with(Arc::new(RecordingTransport::new()));
        let token = SessionToken::new("abc").unwrap();
        assert_eq!(factory.client(Some(&token)).access_mode(), AccessMode::Authenticated);
        assert_eq!(factory.client(None).access_mode(), AccessMode::Public);
        assert_eq!(AccessMode::Public.to_string(), "public");
    }

    #[test]
    fn test_authenticated_requires_token() {
        let factory = factory_with(Arc::new(RecordingTransport::new()));
        let err = factory.authenticated(&RequestContext::anonymous()).err().unwrap();
        assert!(matches!(err, TenantbaseError::AuthenticationRequired(_)));
    }

    #[test]
    fn test_table_name_is_validated() {
        let factory = factory_with(Arc::new(RecordingTransport::new()));
        let client = factory.client(None);
        assert!(client.table("livestock").is_ok());
        assert!(matches!(
            client.table("livestock;drop").err().unwrap(),
            TenantbaseError::InvalidArgument(_)
        ));
    }

    #[tokio::test]
    async fn test_token_attached_to_every_call() {
        for raw in ["abc", "eyJhbGciOiJIUzI1NiJ9.payload.sig", "tenant-7-token"] {
            let transport = Arc::new(RecordingTransport::new());
            let factory = factory_with(Arc::clone(&transport));
            let token = SessionToken::new(raw).unwrap();
            let client = factory.client(Some(&token));

            client.table("fields").unwrap().select("*").execute().await.unwrap();
            client
                .table("fields")
                .unwrap()
                .insert(json!({"name": "North 40"}))
                .execute()
                .await
                .unwrap();
            client
                .table("fields")
                .unwrap()
                .update(json!({"acreage": 40}))
                .eq("id", "7")
                .execute()
                .await
                .unwrap();
            client.table("fields").unwrap().delete().eq("id", "7").execute().await.unwrap();

            let requests = transport.requests();
            assert_eq!(requests.len(), 4);
            for request in requests {
                assert_eq!(request.header("authorization"), Some(format!("Bearer {raw}").as_str()));
                assert_eq!(request.header("apikey"), Some("anon-key"));
            }
        }
    }

    #[tokio::test]
    async fn test_public_mode_sends_anon_key_as_bearer() {
        let transport = Arc::new(RecordingTransport::new());
        let factory = factory_with(Arc::clone(&transport));
        factory.client(None).table("bins").unwrap().select("*").execute().await.unwrap();

        let request = transport.last();
        assert_eq!(request.header("authorization"), Some("Bearer anon-key"));
        assert_eq!(request.header("x-client-info"), Some(CLIENT_INFO));
    }

    #[tokio::test]
    async fn test_request_id_forwarded() {
        let transport = Arc::new(RecordingTransport::new());
        let factory = factory_with(Arc::clone(&transport));
        let ctx = RequestContext::anonymous().with_request_id("req-42");
        factory.for_context(&ctx).table("bins").unwrap().select("*").execute().await.unwrap();
        assert_eq!(transport.last().header("x-request-id"), Some("req-42"));
    }

    #[tokio::test]
    async fn test_custom_schema_profiles() {
        let transport = Arc::new(RecordingTransport::new());
        let mut config = TenantbaseConfig::new("https://project.supabase.co", "anon-key");
        config.schema = "farm".to_string();
        let factory = ClientFactory::with_transport(config, transport.clone()).unwrap();
        let client = factory.client(None);

        client.table("bins").unwrap().select("*").execute().await.unwrap();
        assert_eq!(transport.last().header("accept-profile"), Some("farm"));

        client.table("bins").unwrap().insert(json!({"name": "Bin 1"})).execute().await.unwrap();
        assert_eq!(transport.last().header("content-profile"), Some("farm"));
        assert_eq!(transport.last().header("accept-profile"), None);
    }

    #[tokio::test]
    async fn test_reads_retry_server_errors() {
        let transport = Arc::new(RecordingTransport::new());
        transport.reply(RawResponse::new(503, ""));
        transport.reply(RawResponse::new(200, r#"[{"id":"1"}]"#));
        let factory = factory_with(Arc::clone(&transport));

        let response = factory
            .client(None)
            .table("bins")
            .unwrap()
            .select("*")
            .execute()
            .await
            .unwrap();
        assert_eq!(response.row_count(), 1);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_max_retries_counts_retries_after_first_attempt() {
        let transport = Arc::new(RecordingTransport::new());
        for _ in 0..3 {
            transport.reply(RawResponse::new(503, ""));
        }
        let mut config = TenantbaseConfig::new("https://project.supabase.co", "anon-key");
        config.max_retries = 1;
        let factory = ClientFactory::with_transport(config, transport.clone()).unwrap();

        let err = factory.client(None).table("bins").unwrap().execute().await.unwrap_err();
        assert!(matches!(err, TenantbaseError::Remote { status: 503, .. }));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_sends_once() {
        let transport = Arc::new(RecordingTransport::new());
        transport.reply(RawResponse::new(503, ""));
        let mut config = TenantbaseConfig::new("https://project.supabase.co", "anon-key");
        config.max_retries = 0;
        let factory = ClientFactory::with_transport(config, transport.clone()).unwrap();

        let err = factory.client(None).table("bins").unwrap().execute().await.unwrap_err();
        assert!(matches!(err, TenantbaseError::Remote { status: 503, .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_writes_are_not_retried() {
        let transport = Arc::new(RecordingTransport::new());
        transport.reply(RawResponse::new(503, ""));
        let factory = factory_with(Arc::clone(&transport));
        let token = SessionToken::new("abc").unwrap();

        let err = factory
            .client(Some(&token))
            .table("bins")
            .unwrap()
            .update(json!({"capacity": 10}))
            .eq("id", "1")
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(err, TenantbaseError::Remote { status: 503, .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_auth_rejection_not_retried() {
        let transport = Arc::new(RecordingTransport::new());
        transport.reply(RawResponse::new(401, r#"{"code":"PGRST301","message":"JWT expired"}"#));
        let factory = factory_with(Arc::clone(&transport));

        let err = factory
            .client(Some(&SessionToken::new("stale").unwrap()))
            .table("bins")
            .unwrap()
            .select("*")
            .execute()
            .await
            .unwrap_err();
        assert!(err.is_auth_failure());
        assert_eq!(transport.requests().len(), 1);
    }
}
