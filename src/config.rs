//! Configuration for the upstream API and the feed handlers.
//!
//! Nothing here reads global state on its own: `from_env` is a thin wrapper
//! over `from_lookup`, so tests can build configs from plain maps.

use crate::error::{FeedError, Result};
use url::Url;

/// Environment variable holding the API service (consumer) key
pub const SERVICE_KEY_VAR: &str = "TWITTER_SERVICE_KEY";

/// Environment variable holding the API secret key
pub const SECRET_KEY_VAR: &str = "TWITTER_SECRET_KEY";

/// Environment variable overriding the upstream base URL
pub const API_BASE_VAR: &str = "TWITTER_API_BASE";

/// Upstream API base URL
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// Fallback searches fire only while fewer results than this have been collected
pub const DEFAULT_FALLBACK_THRESHOLD: usize = 10;

/// Service credentials exchanged for a bearer token on every request.
#[derive(Clone)]
pub struct Credentials {
    pub service_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(service_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            service_key: service_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Read credentials through `lookup`, failing if either key is absent or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| FeedError::Config(format!("{} is not set", name)))
        };

        Ok(Self {
            service_key: read(SERVICE_KEY_VAR)?,
            secret_key: read(SECRET_KEY_VAR)?,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

// Keep secrets out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("service_key", &"***")
            .field("secret_key", &"***")
            .finish()
    }
}

/// Location of the upstream API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base_url: String,
}

impl ApiConfig {
    /// Create an API config for `base_url` (scheme and host, no trailing path needed).
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| FeedError::Config(format!("Invalid API base URL {:?}: {}", base_url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FeedError::Config(format!(
                "Unsupported API base URL scheme: {}",
                parsed.scheme()
            )));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(API_BASE_VAR).filter(|v| !v.is_empty()) {
            Some(base) => Self::new(&base),
            None => Ok(Self::default()),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token endpoint: `POST /oauth2/token`
    pub fn token_url(&self) -> String {
        format!("{}/oauth2/token", self.base_url)
    }

    /// Search endpoint: `GET /1.1/search/tweets.json`
    pub fn search_url(&self) -> String {
        format!("{}/1.1/search/tweets.json", self.base_url)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// Which inbound parameters a handler reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// `t` (title, required), `a` (author), `j` (journal)
    MultiField,
    /// `q` (raw query, required)
    Freeform,
}

/// What a handler does when the token or a search call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Answer 400 with the upstream error
    Abort,
    /// Answer 200 with an empty result set
    Degrade,
}

/// Parameters of one feed handler.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub mode: QueryMode,
    pub fallback_threshold: usize,
    pub encode_query: bool,
    pub on_failure: FailurePolicy,
}

impl HandlerConfig {
    /// Title search with author and journal fallbacks.
    pub fn multi_field() -> Self {
        Self {
            mode: QueryMode::MultiField,
            fallback_threshold: DEFAULT_FALLBACK_THRESHOLD,
            encode_query: true,
            on_failure: FailurePolicy::Abort,
        }
    }

    /// Single search with the caller's raw query.
    pub fn freeform() -> Self {
        Self {
            mode: QueryMode::Freeform,
            fallback_threshold: DEFAULT_FALLBACK_THRESHOLD,
            encode_query: false,
            on_failure: FailurePolicy::Degrade,
        }
    }

    pub fn with_fallback_threshold(mut self, threshold: usize) -> Self {
        self.fallback_threshold = threshold;
        self
    }

    pub fn with_encode_query(mut self, encode: bool) -> Self {
        self.encode_query = encode;
        self
    }
}
