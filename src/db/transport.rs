

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_RANGE, Client, Request};
use tracing::debug;

use crate::core::error::Result;


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_range: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_range: None,
            body: body.into(),
        }
    }

    pub fn with_content_range(mut self, range: impl Into<String>) -> Self {
        self.content_range = Some(range.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}


/// Sends a fully built request and returns the raw reply.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<RawResponse>;
}


pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<RawResponse> {
        debug!("{} {}", request.method(), request.url().path());
        let response = self.client.execute(request).await?;
        let status = response.status().as_u16();
        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        Ok(RawResponse {
            status,
            content_range,
            body,
        })
    }
}
