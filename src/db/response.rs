

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use super::transport::RawResponse;
use crate::core::error::{Result, TenantbaseError};


/// PostgREST sends `"code": "PGRST301"`, the auth server `"code": 400`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorCode {
    Text(String),
    Number(serde_json::Number),
}

impl ErrorCode {
    fn into_string(self) -> String {
        match self {
            ErrorCode::Text(s) => s,
            ErrorCode::Number(n) => n.to_string(),
        }
    }
}


#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    #[serde(default)]
    code: Option<ErrorCode>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
    // auth endpoints answer with these instead
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}


#[derive(Debug, Clone, PartialEq)]
pub struct PostgrestResponse {
    pub status: u16,
    pub data: Value,
    pub count: Option<u64>,
}

impl PostgrestResponse {
    /// Turns a raw reply into a response, or into `Remote` for non-2xx statuses.
    pub fn from_raw(raw: RawResponse) -> Result<Self> {
        if !raw.is_success() {
            return Err(remote_error(&raw));
        }
        let data = if raw.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&raw.body)?
        };
        Ok(Self {
            status: raw.status,
            data,
            count: raw.content_range.as_deref().and_then(parse_content_range),
        })
    }

    /// Returned rows. A single object counts as one row; `null` as none.
    pub fn rows(&self) -> Vec<&Value> {
        match &self.data {
            Value::Array(items) => items.iter().collect(),
            Value::Null => Vec::new(),
            other => vec![other],
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }

    pub fn into_rows<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        match self.data {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).map_err(Into::into))
                .collect(),
            single => Ok(vec![serde_json::from_value(single)?]),
        }
    }
}


pub(crate) fn remote_error(raw: &RawResponse) -> TenantbaseError {
    let parsed: Option<PostgrestErrorBody> = serde_json::from_str(&raw.body).ok();
    let (code, message) = match parsed {
        Some(body) => {
            let mut message = body
                .message
                .or(body.error_description)
                .or(body.msg)
                .unwrap_or_else(|| status_text(raw.status));
            if let Some(details) = body.details.filter(|d| !d.is_empty()) {
                message = format!("{message} ({details})");
            }
            if let Some(hint) = body.hint.filter(|h| !h.is_empty()) {
                message = format!("{message}; hint: {hint}");
            }
            let code = body.error_code.or_else(|| body.code.map(ErrorCode::into_string));
            (code, message)
        }
        None if raw.body.trim().is_empty() => (None, status_text(raw.status)),
        None => (None, crate::utils::safe_truncate(raw.body.trim(), 200)),
    };
    TenantbaseError::Remote {
        status: raw.status,
        code,
        message,
    }
}

fn status_text(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("unexpected status")
        .to_string()
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn parse_content_range(range: &str) -> Option<u64> {
    let (_, total) = range.rsplit_once('/')?;
    total.trim().parse().ok()
}
