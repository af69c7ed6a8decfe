use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::util::http;

/// One outgoing HTTP exchange, described independently of the client library.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Serialize `body` as JSON and set the content type.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_vec(body)?);
        if !self.has_header("content-type") {
            self.headers
                .push(("Content-Type".to_string(), "application/json".to_string()));
        }
        Ok(self)
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header_value(name).is_some()
    }
}

/// A response whose body has already been drained into memory.
///
/// The body is read off the wire exactly once, by the transport. Everything
/// downstream (401 handling, error message extraction, payload parsing)
/// borrows the same buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, lossy on invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Body parsed as arbitrary JSON. Empty or invalid bodies yield `None`.
    pub fn json_value(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Whatever explanation the server put in the body.
    ///
    /// A JSON body is only asked for its `message` or `error` string; when it
    /// has neither there is no message. The raw text is used only for bodies
    /// that are not JSON at all. `None` for blank bodies.
    pub fn server_message(&self) -> Option<String> {
        if let Some(value) = self.json_value() {
            return ["message", "error"].iter().find_map(|field| {
                value
                    .get(*field)
                    .and_then(|v| v.as_str())
                    .filter(|msg| !msg.trim().is_empty())
                    .map(str::to_string)
            });
        }

        let text = self.text();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Human-readable failure message for a non-2xx response, falling back
    /// to `HTTP error! status: {code}`.
    pub fn error_message(&self) -> String {
        self.server_message()
            .unwrap_or_else(|| format!("HTTP error! status: {}", self.status))
    }

    /// Pass 2xx responses through, turn anything else into `ApiError::Status`.
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::Status {
                status: self.status,
                message: self.error_message(),
            })
        }
    }
}

/// Performs a single HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Transport backed by a pooled `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self::new(http::build_client(config)?))
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(http::client().clone())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!("HTTP {} ({} bytes)", status, body.len());

        Ok(ApiResponse { status, body })
    }
}
