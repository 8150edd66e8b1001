//! HTTP/HTTPS Sink - RESTful Batch Ingest
//!
//! ## Overview
//!
//! Posts each batch document to a single ingest endpoint. HTTP is the
//! simplest way to get batches into an existing web service, at the cost of
//! header overhead that does not matter at one request per sync window.
//!
//! ## Implementation Choices
//!
//! We intentionally keep this simple and lightweight:
//! - Blocking `ureq` client, no async runtime
//! - One POST per batch, body is the batch document unchanged
//! - No retries: a failed POST is reported and the scheduler resends the
//!   same batch next window
//! - Per-call timeout is the tighter of the configured timeout and the
//!   deadline the scheduler passes in
//!
//! ## Status Handling
//!
//! | Response        | Result                                   |
//! |-----------------|------------------------------------------|
//! | 2xx             | accepted, log cleared                    |
//! | 4xx / 5xx       | `HttpError::ServerError`, batch retained |
//! | transport error | `HttpError::Request`, batch retained     |
//!
//! ## Example Usage
//!
//! ```no_run
//! use motionsync_connectors::http::{HttpConfig, HttpSink};
//!
//! let config = HttpConfig::new("https://ingest.example.com")
//!     .path("/v1/motion/batches")
//!     .api_key("X-Device-Key", "d3v1c3")
//!     .header("X-Device-Id", "wrist-042");
//!
//! let sink = HttpSink::new(config)?;
//! # Ok::<(), motionsync_connectors::http::HttpError>(())
//! ```

use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use log::{debug, warn};
use motionsync_core::traits::CloudSink;
use thiserror::Error;

use crate::ConnectionStats;

/// HTTP-specific errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(String),

    /// Server returned error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// HTTP configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Ingest path appended to the base URL
    pub path: String,
    /// Request timeout
    pub timeout: Duration,
    /// Authentication method
    pub auth: AuthMethod,
    /// Custom headers
    pub headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

/// Authentication methods
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// No authentication
    None,
    /// Bearer token
    Bearer(String),
    /// Basic authentication
    Basic { username: String, password: String },
    /// API key in header
    ApiKey { header: String, value: String },
}

impl AuthMethod {
    /// Header carrying the credentials, if any
    pub fn header(&self) -> Option<(String, String)> {
        match self {
            AuthMethod::None => None,
            AuthMethod::Bearer(token) => Some(("Authorization".into(), format!("Bearer {}", token))),
            AuthMethod::Basic { username, password } => {
                let credentials = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                Some(("Authorization".into(), format!("Basic {}", credentials)))
            }
            AuthMethod::ApiKey { header, value } => Some((header.clone(), value.clone())),
        }
    }
}

impl HttpConfig {
    /// Create new configuration with base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: "/v1/motion/batches".into(),
            timeout: Duration::from_secs(30),
            auth: AuthMethod::None,
            headers: HashMap::new(),
            user_agent: format!("MotionSync/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set ingest path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set bearer token authentication
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMethod::Bearer(token.into());
        self
    }

    /// Set basic authentication
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Set API key authentication
    pub fn api_key(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth = AuthMethod::ApiKey {
            header: header.into(),
            value: value.into(),
        };
        self
    }

    /// Set request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Add custom header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Full ingest URL
    pub fn url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.path.starts_with('/') {
            format!("{}{}", base, self.path)
        } else {
            format!("{}/{}", base, self.path)
        }
    }

    /// Timeout for one call given the scheduler's deadline
    pub fn effective_timeout(&self, deadline_ms: u32) -> Duration {
        self.timeout.min(Duration::from_millis(u64::from(deadline_ms)))
    }

    fn validate(&self) -> Result<(), HttpError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(HttpError::Config("Base URL must start with http:// or https://".into()));
        }
        if self.timeout.is_zero() {
            return Err(HttpError::Config("Timeout must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Cloud sink posting batches with the lightweight ureq client
pub struct HttpSink {
    config: HttpConfig,
    url: String,
    agent: ureq::Agent,
    stats: ConnectionStats,
}

impl HttpSink {
    /// Create new HTTP sink
    pub fn new(config: HttpConfig) -> Result<Self, HttpError> {
        config.validate()?;

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();

        Ok(Self {
            url: config.url(),
            config,
            agent,
            stats: ConnectionStats::default(),
        })
    }

    /// Delivery statistics
    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Active configuration
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Build request with authentication and headers
    fn build_request(&self, timeout: Duration) -> ureq::Request {
        let mut request = self.agent.post(&self.url).timeout(timeout);

        if let Some((name, value)) = self.config.auth.header() {
            request = request.set(&name, &value);
        }

        for (name, value) in &self.config.headers {
            request = request.set(name, value);
        }

        request
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
    }

    fn post(&self, payload: &[u8], deadline_ms: u32) -> Result<(), HttpError> {
        let request = self.build_request(self.config.effective_timeout(deadline_ms));

        match request.send_bytes(payload) {
            Ok(resp) if (200..300).contains(&resp.status()) => Ok(()),
            Ok(resp) => Err(HttpError::ServerError {
                status: resp.status(),
                message: resp.status_text().to_string(),
            }),
            Err(ureq::Error::Status(status, resp)) => Err(HttpError::ServerError {
                status,
                message: resp.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(e)) => Err(HttpError::Request(e.to_string())),
        }
    }
}

impl CloudSink for HttpSink {
    type Error = HttpError;

    fn send_batch(&mut self, payload: &[u8], timeout_ms: u32) -> Result<(), Self::Error> {
        debug!("POST {} ({} bytes)", self.url, payload.len());

        match self.post(payload, timeout_ms) {
            Ok(()) => {
                self.stats.record_success(payload.len());
                Ok(())
            }
            Err(e) => {
                warn!("batch upload to {} failed: {}", self.url, e);
                self.stats.record_failure(&e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = HttpConfig::new("https://api.example.com")
            .bearer_token("test-token")
            .timeout_secs(60)
            .path("/ingest")
            .header("X-Custom", "value");

        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.url(), "https://api.example.com/ingest");
        assert!(config.headers.contains_key("X-Custom"));

        match config.auth {
            AuthMethod::Bearer(token) => assert_eq!(token, "test-token"),
            _ => panic!("Wrong auth method"),
        }
    }

    #[test]
    fn test_url_joining() {
        assert_eq!(
            HttpConfig::new("https://api.example.com/").path("batches").url(),
            "https://api.example.com/batches"
        );
        assert_eq!(
            HttpConfig::new("http://10.0.0.2:8080").url(),
            "http://10.0.0.2:8080/v1/motion/batches"
        );
    }

    #[test]
    fn test_url_validation() {
        assert!(matches!(HttpSink::new(HttpConfig::new("not-a-url")), Err(HttpError::Config(_))));
        assert!(HttpSink::new(HttpConfig::new("https://valid.url")).is_ok());
        assert!(HttpSink::new(HttpConfig::new("https://valid.url").timeout_secs(0)).is_err());
    }

    #[test]
    fn test_auth_headers() {
        assert_eq!(AuthMethod::None.header(), None);
        assert_eq!(
            AuthMethod::Bearer("abc".into()).header(),
            Some(("Authorization".into(), "Bearer abc".into()))
        );
        assert_eq!(
            HttpConfig::new("https://x").basic_auth("user", "pass").auth.header(),
            Some(("Authorization".into(), "Basic dXNlcjpwYXNz".into()))
        );
        assert_eq!(
            HttpConfig::new("https://x").api_key("X-Key", "k").auth.header(),
            Some(("X-Key".into(), "k".into()))
        );
    }

    #[test]
    fn test_deadline_tightens_timeout() {
        let config = HttpConfig::new("https://x").timeout_secs(30);
        assert_eq!(config.effective_timeout(5_000), Duration::from_secs(5));
        assert_eq!(config.effective_timeout(60_000), Duration::from_secs(30));
    }
}
