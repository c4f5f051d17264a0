//! HTTP invoker for the platform and regional REST APIs
//!
//! [`ApiClient::invoke`] sends exactly one authenticated request and never retries;
//! retrying is the poller's business. In dry-run mode the request is rendered as a
//! curl command (credentials redacted) and handed to the preview sink instead of
//! being sent.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{CoreError, RemoteError, Result};

/// User agent string for glctl HTTP requests
pub const DEFAULT_USER_AGENT: &str = concat!("glctl/", env!("CARGO_PKG_VERSION"));

/// JSON keys whose values never leave the process unredacted
const SENSITIVE_KEYS: &[&str] = &[
    "clientSecret",
    "client_secret",
    "refreshToken",
    "refresh_token",
    "secret",
    "password",
    "token",
];

const REDACTED: &str = "<REDACTED>";

/// HTTP methods used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Patch => write!(f, "PATCH"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Request body content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Json,
    /// RFC 7396 merge patch, used for partial updates
    MergePatch,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::MergePatch => "application/merge-patch+json",
        }
    }
}

/// One request to send (or preview)
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<Value>,
    pub content_type: ContentType,
}

impl ApiRequest {
    fn new(method: HttpMethod, url: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            url: url.into(),
            body,
            content_type: ContentType::Json,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url, None)
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, url, Some(body))
    }

    /// POST without a body, used by action endpoints
    pub fn post_empty(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url, None)
    }

    pub fn put(url: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Put, url, Some(body))
    }

    /// PATCH with `application/merge-patch+json`
    pub fn patch(url: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Patch, url, Some(body)).with_content_type(ContentType::MergePatch)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url, None)
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }
}

/// A successful (2xx) response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

/// Raw detail of the most recent failed response
#[derive(Debug, Clone, PartialEq)]
pub struct LastResponse {
    pub status: u16,
    pub body: String,
}

/// Receives the rendered dry-run preview
pub type PreviewSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Authenticated client for the REST APIs
pub struct ApiClient {
    http: reqwest::Client,
    token: String,
    last_response: Mutex<Option<LastResponse>>,
    preview: PreviewSink,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("token", &REDACTED)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ApiClient`]
pub struct ApiClientBuilder {
    token: Option<String>,
    user_agent: String,
    timeout: Option<Duration>,
    preview: Option<PreviewSink>,
}

impl ApiClientBuilder {
    /// Bearer token attached to every request
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Where dry-run previews go (stdout by default)
    pub fn preview_sink(mut self, sink: PreviewSink) -> Self {
        self.preview = Some(sink);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let token = self
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CoreError::Validation("An API token is required".to_string()))?;

        let mut builder = reqwest::Client::builder().user_agent(self.user_agent);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(ApiClient {
            http: builder.build()?,
            token,
            last_response: Mutex::new(None),
            preview: self
                .preview
                .unwrap_or_else(|| Arc::new(|text: &str| println!("{}", text))),
        })
    }
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder {
            token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            preview: None,
        }
    }

    /// Send one request, or preview it when `dry_run` is set
    ///
    /// Returns `Ok(None)` for a preview. A non-2xx answer is recorded in the
    /// last-response side channel and returned as [`CoreError::Remote`].
    pub async fn invoke(&self, request: &ApiRequest, dry_run: bool) -> Result<Option<ApiResponse>> {
        if dry_run {
            warn!("Dry run: {} {} was not sent", request.method, request.url);
            (self.preview)(&render_preview(request));
            return Ok(None);
        }

        self.clear_last_response();

        debug!("{} {}", request.method, request.url);
        if let Some(body) = &request.body {
            trace!("Request body: {}", redact_sensitive(body));
        }

        let mut builder = self
            .http
            .request(request.method.into(), &request.url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json");

        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, request.content_type.as_str())
                .body(serde_json::to_vec(body)?);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        debug!("{} {} returned HTTP {}", request.method, request.url, status);

        if !(200..300).contains(&status) {
            self.record_last_response(status, &text);
            let body = if text.trim().is_empty() {
                None
            } else {
                Some(parse_body(&text))
            };
            return Err(RemoteError::new(request.method.to_string(), &request.url, status, body).into());
        }

        Ok(Some(ApiResponse {
            status,
            body: parse_body(&text),
        }))
    }

    /// The most recent failed response, if the last request failed remotely
    pub fn last_response(&self) -> Option<LastResponse> {
        self.last_response
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    /// Raw remote detail of the last failure, if any body was returned
    pub fn last_error_detail(&self) -> Option<String> {
        self.last_response()
            .map(|r| r.body.trim().to_string())
            .filter(|body| !body.is_empty())
    }

    fn record_last_response(&self, status: u16, body: &str) {
        if let Ok(mut guard) = self.last_response.lock() {
            *guard = Some(LastResponse {
                status,
                body: body.to_string(),
            });
        }
    }

    fn clear_last_response(&self) {
        if let Ok(mut guard) = self.last_response.lock() {
            *guard = None;
        }
    }
}

/// Empty bodies become `Null`; non-JSON bodies are kept as a string
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Replace the values of sensitive keys, recursively
pub fn redact_sensitive(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| {
                    if SENSITIVE_KEYS.contains(&key.as_str()) && !v.is_null() {
                        (key.clone(), Value::String(REDACTED.to_string()))
                    } else {
                        (key.clone(), redact_sensitive(v))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive).collect()),
        other => other.clone(),
    }
}

/// Wrap a value in single quotes for a POSIX shell
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Render a request as a curl command with credentials redacted
pub fn render_preview(request: &ApiRequest) -> String {
    let mut parts = vec![
        "curl".to_string(),
        "-s".to_string(),
        format!("-X {}", request.method),
    ];

    parts.push(shell_quote(&request.url));
    parts.push("-H 'Accept: application/json'".to_string());
    parts.push(format!("-H 'Authorization: Bearer {}'", REDACTED));

    if let Some(body) = &request.body {
        parts.push(format!("-H 'Content-Type: {}'", request.content_type.as_str()));
        parts.push(format!("-d {}", shell_quote(&redact_sensitive(body).to_string())));
    }

    parts.join(" \\\n  ")
}
