//! HTTP transport seam for provider adapters.
//!
//! Adapters build an [`HttpRequest`] and hand it to an [`HttpTransport`].
//! Production code uses [`ReqwestTransport`]. Tests script responses with
//! `ScriptedTransport` and inspect what was sent; it is compiled for this
//! crate's own tests and behind the `test-util` feature.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::fmt;
use std::time::Duration;
#[cfg(any(test, feature = "test-util"))]
use {parking_lot::Mutex, std::collections::VecDeque};

use super::ProviderError;

/// An outbound JSON POST.
#[derive(Clone)]
pub struct HttpRequest {
    pub url: String,
    /// Query parameters; values may hold credentials.
    pub query: Vec<(&'static str, String)>,
    /// Header values may hold credentials.
    pub headers: Vec<(&'static str, String)>,
    pub body: JsonValue,
}

impl HttpRequest {
    pub fn post(url: impl Into<String>, body: JsonValue) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query: Vec<&str> = self.query.iter().map(|(n, _)| *n).collect();
        let headers: Vec<&str> = self.headers.iter().map(|(n, _)| *n).collect();
        f.debug_struct("HttpRequest")
            .field("url", &self.url)
            .field("query", &query)
            .field("headers", &headers)
            .finish_non_exhaustive()
    }
}

/// Status, optional `Retry-After` and raw body of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub retry_after: Option<Duration>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn ok_json(body: &JsonValue) -> Self {
        Self::new(200, body.to_string())
    }
}

/// Something that can POST JSON and return the response.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError>;
}

/// reqwest-backed transport with a per-request timeout.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

#[cfg(feature = "http")]
impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self { client, timeout })
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError> {
        let mut builder = self
            .client
            .post(&request.url)
            .query(&request.query)
            .json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        // without_url: query strings can carry credentials
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout)
            } else {
                ProviderError::Transport(e.without_url().to_string())
            }
        })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout)
            } else {
                ProviderError::Transport(e.without_url().to_string())
            }
        })?;

        Ok(HttpResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// One scripted outcome for [`ScriptedTransport`].
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Respond(HttpResponse),
    /// Fails with [`ProviderError::Transport`].
    Fail(String),
    /// Fails with [`ProviderError::Timeout`].
    TimeOut(Duration),
}

#[cfg(any(test, feature = "test-util"))]
impl ScriptedReply {
    pub fn rate_limited() -> Self {
        ScriptedReply::Respond(HttpResponse::new(
            429,
            r#"{"error": {"message": "Resource has been exhausted"}}"#,
        ))
    }
}

/// In-memory transport that replays scripted replies in order.
///
/// Every request is recorded; when the script runs out, further requests
/// fail with a transport error.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<HttpRequest>>,
    latency: Option<Duration>,
}

#[cfg(any(test, feature = "test-util"))]
impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    /// Delay every reply by `latency` (on the tokio clock).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn push(&self, reply: ScriptedReply) {
        self.replies.lock().push_back(reply);
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError> {
        self.requests.lock().push(request);
        let reply = self.replies.lock().pop_front();

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match reply {
            Some(ScriptedReply::Respond(response)) => Ok(response),
            Some(ScriptedReply::Fail(message)) => Err(ProviderError::Transport(message)),
            Some(ScriptedReply::TimeOut(after)) => Err(ProviderError::Timeout(after)),
            None => Err(ProviderError::Transport("no scripted reply left".to_string())),
        }
    }
}
