//! Fetcher Types - config, fetched page, fetch errors

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

// ============================================================================
// CONFIG
// ============================================================================

/// Per-call-site fetch settings
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Hard limit on the whole exchange, redirects and body included
    pub timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
    /// Honour HTTP(S)_PROXY from the environment
    pub use_system_proxy: bool,
}

impl FetchConfig {
    /// Bulk collection: favour completeness
    pub fn collection() -> Self {
        Self {
            timeout: constants::get_collect_timeout(),
            ..Self::default()
        }
    }

    /// Serving: favour latency
    pub fn serving() -> Self {
        Self {
            timeout: constants::get_serving_timeout(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(constants::DEFAULT_COLLECT_TIMEOUT_SECS),
            max_redirects: constants::DEFAULT_MAX_REDIRECTS,
            user_agent: constants::DEFAULT_USER_AGENT.to_string(),
            use_system_proxy: true,
        }
    }
}

// ============================================================================
// FETCHED PAGE
// ============================================================================

/// Final response of a successful GET
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPage {
    /// URL as the caller asked for it
    pub requested_url: String,
    /// URL of the response the body came from
    pub final_url: String,
    pub status: u16,
    /// Every URL redirected to, in order
    pub redirects: Vec<String>,
    pub body: String,
}

// ============================================================================
// ERRORS
// ============================================================================

/// Any reason a page could not be fetched
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// URL rejected before any request was made
    InvalidUrl(String),
    /// Hard timeout elapsed
    Timeout(Duration),
    /// DNS, TCP or TLS failure
    Connect(String),
    /// Final response was not 2xx
    Status(u16),
    TooManyRedirects(usize),
    /// 3xx without a usable Location header
    MissingLocation(u16),
    /// Body could not be read or decoded
    Body(String),
    /// Any other request failure
    Request(String),
    /// HTTP client could not be built
    Client(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            Self::Timeout(after) => write!(f, "Timed out after {:?}", after),
            Self::Connect(msg) => write!(f, "Connection failed: {}", msg),
            Self::Status(code) => write!(f, "HTTP status {}", code),
            Self::TooManyRedirects(n) => write!(f, "Too many redirects (>{})", n),
            Self::MissingLocation(code) => write!(f, "HTTP {} without Location header", code),
            Self::Body(msg) => write!(f, "Failed to read body: {}", msg),
            Self::Request(msg) => write!(f, "Request failed: {}", msg),
            Self::Client(msg) => write!(f, "HTTP client error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            FetchError::Body(e.to_string())
        } else if e.is_builder() {
            FetchError::InvalidUrl(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}
