//! HTTP client for the REST API
//!
//! Each consumer builds its own [`ApiClient`] from an explicit
//! [`ClientConfig`]; there are no process-wide defaults to mutate.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use super::ApiError;

/// Timeout applied when neither the config nor the call sets one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Construction-time client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Sent with every request; per-call headers override them
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Per-call overrides
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub base_url: Option<String>,
    /// Query string parameters
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bodies
// ─────────────────────────────────────────────────────────────────────────────

/// Request payload
pub enum RequestBody {
    /// Serialized as JSON
    Json(Value),
    /// Multi-part file payload; the transport sets Content-Type and boundary
    Multipart(reqwest::multipart::Form),
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<reqwest::multipart::Form> for RequestBody {
    fn from(form: reqwest::multipart::Form) -> Self {
        Self::Multipart(form)
    }
}

/// Parsed response body
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    Json(Value),
    Text(String),
    Empty,
}

impl ResponseData {
    /// Dispatch on the declared content kind
    pub fn parse(status: u16, content_type: &str, body: &[u8]) -> Self {
        if matches!(status, 204 | 205 | 304) || body.is_empty() {
            return Self::Empty;
        }

        let content_type = content_type.to_ascii_lowercase();
        let text = || String::from_utf8_lossy(body).into_owned();
        if content_type.contains("application/json") || content_type.contains("+json") {
            // Servers mislabel bodies; fall back to the raw text
            match serde_json::from_slice(body) {
                Ok(value) => Self::Json(value),
                Err(_) => Self::Text(text()),
            }
        } else {
            Self::Text(text())
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Short human-readable description, preferring the API's `detail` field
    pub fn summary(&self) -> String {
        match self {
            Self::Json(value) => match value.get("detail") {
                Some(Value::String(detail)) => detail.clone(),
                Some(other) => other.to_string(),
                None => value.to_string(),
            },
            Self::Text(text) if text.len() > 200 => {
                let cut = text.char_indices().nth(200).map(|(i, _)| i).unwrap_or(text.len());
                format!("{}...", &text[..cut])
            }
            Self::Text(text) => text.clone(),
            Self::Empty => "no body".to_string(),
        }
    }

    /// Deserialize into a typed value
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Self::Json(value) => serde_json::from_value(value).map_err(ApiError::decode),
            Self::Text(text) => serde_json::from_str(&text).map_err(ApiError::decode),
            Self::Empty => serde_json::from_value(Value::Null).map_err(ApiError::decode),
        }
    }
}

/// A successful response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub status_text: String,
    /// Lowercased header names
    pub headers: HashMap<String, String>,
    pub data: ResponseData,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        self.data.deserialize()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// REST client bound to one [`ClientConfig`]
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        // Timeouts are applied per request so call options can override them
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ApiError::Client {
                message: e.to_string(),
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        self.send(Method::GET, path, None, options).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.send(Method::POST, path, Some(body.into()), options).await
    }

    pub async fn put(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.send(Method::PUT, path, Some(body.into()), options).await
    }

    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        self.send(Method::DELETE, path, None, options).await
    }

    fn url(base: &str, path: &str) -> Result<reqwest::Url, ApiError> {
        let joined = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        reqwest::Url::parse(&joined).map_err(|_| ApiError::InvalidUrl { url: joined })
    }

    fn headers(&self, extra: &[(String, String)], multipart: bool) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        for (name, value) in self.config.headers.iter().chain(extra) {
            let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| ApiError::InvalidHeader {
                name: name.clone(),
            })?;
            let value = HeaderValue::from_str(value).map_err(|_| ApiError::InvalidHeader {
                name: name.clone(),
            })?;
            headers.insert(header, value);
        }
        if multipart {
            headers.remove(CONTENT_TYPE);
        }
        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let base = options.base_url.as_deref().unwrap_or(&self.config.base_url);
        let url = Self::url(base, path)?;
        let timeout = options.timeout.unwrap_or(self.config.timeout);
        let multipart = matches!(body, Some(RequestBody::Multipart(_)));
        let headers = self.headers(&options.headers, multipart)?;

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .headers(headers)
            .timeout(timeout);
        if !options.params.is_empty() {
            request = request.query(&options.params);
        }
        request = match body {
            Some(RequestBody::Json(value)) => request.json(&value),
            Some(RequestBody::Multipart(form)) => request.multipart(form),
            None => request,
        };

        let transport = |e: reqwest::Error| {
            if e.is_timeout() {
                ApiError::Timeout { after: timeout }
            } else {
                ApiError::Transport {
                    message: e.to_string(),
                }
            }
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let content_type = headers.get("content-type").cloned().unwrap_or_default();
        let bytes = response.bytes().await.map_err(transport)?;
        let data = ResponseData::parse(status.as_u16(), &content_type, &bytes);

        tracing::debug!(
            method = %method,
            url = %url,
            status = status.as_u16(),
            "API request"
        );

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                status_text,
                data,
            });
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            status_text,
            headers,
            data,
        })
    }
}
