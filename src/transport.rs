//! HTTP transport used by the searcher.
//!
//! The searcher never talks to the network directly; it hands fully formed
//! requests to a [`Transport`]. The body of every response is read to the end
//! before `execute` returns, so nothing is left open on error paths.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::error::BoxError;

/// A GET request ready to send.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: Url,
    pub headers: HeaderMap,
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// Rate limit state reported by the `X-RateLimit-*` headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub remaining: i64,
    pub limit: i64,
    pub reset: Option<DateTime<Utc>>,
}

impl RateLimit {
    /// Parse the rate limit headers; `None` unless both remaining and limit are present.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let number = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<i64>().ok())
        };

        Some(RateLimit {
            remaining: number("X-RateLimit-Remaining")?,
            limit: number("X-RateLimit-Limit")?,
            reset: number("X-RateLimit-Reset").and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining <= 0
    }
}

/// Executes requests on behalf of the searcher.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError>;
}

/// [`Transport`] backed by a `reqwest` client.
pub struct ReqwestTransport {
    client: Client,
    token: Option<String>,
}

impl ReqwestTransport {
    /// Create a transport, authenticating with `token` when one is given.
    pub fn new(token: Option<String>) -> Result<Self, BoxError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ReqwestTransport { client, token })
    }

    /// Create a transport around an existing client.
    pub fn with_client(client: Client, token: Option<String>) -> Self {
        ReqwestTransport { client, token }
    }

    /// Report how much of the rate limit is left. Never waits.
    fn log_rate_limit(headers: &HeaderMap) -> Option<RateLimit> {
        let rate = RateLimit::from_headers(headers)?;
        debug!("Rate limit: {}/{}", rate.remaining, rate.limit);

        if rate.is_exhausted() {
            let reset = rate
                .reset
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "an unknown time".to_string());
            warn!("Rate limit exhausted; resets at {}", reset);
        }
        Some(rate)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        let mut builder = self.client.get(request.url).headers(request.headers);
        if let Some(token) = &self.token {
            builder = builder
                .header("Authorization", format!("Bearer {}", token))
                .header(
                    HeaderName::from_static("x-github-api-version"),
                    HeaderValue::from_static("2022-11-28"),
                );
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        Self::log_rate_limit(&headers);

        let body = response.bytes().await?.to_vec();
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_reads_header() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let response = HttpResponse {
            status: StatusCode::OK,
            headers,
            body: Vec::new(),
        };
        assert_eq!(response.content_type(), Some("application/json"));
    }

    fn rate_headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(*value));
        }
        headers
    }

    #[test]
    fn rate_limit_needs_remaining_and_limit() {
        assert_eq!(ReqwestTransport::log_rate_limit(&HeaderMap::new()), None);
        assert_eq!(
            RateLimit::from_headers(&rate_headers(&[("x-ratelimit-remaining", "5")])),
            None
        );
        assert_eq!(
            RateLimit::from_headers(&rate_headers(&[
                ("x-ratelimit-remaining", "lots"),
                ("x-ratelimit-limit", "30"),
            ])),
            None
        );
    }

    #[test]
    fn rate_limit_parses_reset_time() {
        let rate = ReqwestTransport::log_rate_limit(&rate_headers(&[
            ("x-ratelimit-remaining", "0"),
            ("x-ratelimit-limit", "30"),
            ("x-ratelimit-reset", "1700000000"),
        ]))
        .unwrap();

        assert!(rate.is_exhausted());
        assert_eq!(rate.limit, 30);
        assert_eq!(
            rate.reset.map(|t| t.to_rfc3339()),
            Some("2023-11-14T22:13:20+00:00".to_string())
        );
    }

    #[test]
    fn unparsable_reset_is_dropped() {
        let rate = ReqwestTransport::log_rate_limit(&rate_headers(&[
            ("x-ratelimit-remaining", "12"),
            ("x-ratelimit-limit", "30"),
            ("x-ratelimit-reset", "not-a-number"),
        ]))
        .unwrap();

        assert!(!rate.is_exhausted());
        assert_eq!(rate.remaining, 12);
        assert_eq!(rate.reset, None);
    }
}
