//! Feed requests: parameter validation, token exchange, searches, merge.
//!
//! Each request gets its own token and result accumulator. Searches run one
//! after another; a fallback search is issued only while the accumulated
//! result count is below the handler's threshold, checked after every append.

use crate::config::{ApiConfig, Credentials, FailurePolicy, HandlerConfig, QueryMode};
use crate::error::{FeedError, Result};
use crate::response::FeedResponse;
use crate::search::{quoted, search_tweets};
use crate::token::acquire_token;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{error, info, warn};

/// Error body for a request missing its required parameter
pub const INVALID_PARAMETERS: &str = "Invalid Parameters.";

/// Validated inbound query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedQuery {
    MultiField {
        title: String,
        author: Option<String>,
        journal: Option<String>,
    },
    Freeform {
        query: String,
    },
}

impl FeedQuery {
    /// Read the parameters `mode` expects from the inbound query string.
    pub fn from_params(mode: QueryMode, params: &HashMap<String, String>) -> Result<Self> {
        let get = |name: &str| params.get(name).filter(|v| !v.is_empty()).cloned();
        let invalid = || FeedError::Validation(INVALID_PARAMETERS.to_string());

        match mode {
            QueryMode::MultiField => Ok(FeedQuery::MultiField {
                title: get("t").ok_or_else(invalid)?,
                author: get("a"),
                journal: get("j"),
            }),
            QueryMode::Freeform => Ok(FeedQuery::Freeform {
                query: get("q").ok_or_else(invalid)?,
            }),
        }
    }

    /// Search terms in the order they are tried.
    fn stages(&self) -> Vec<(&'static str, String)> {
        match self {
            FeedQuery::MultiField {
                title,
                author,
                journal,
            } => {
                let mut stages = vec![("title", title.clone())];
                if let Some(author) = author {
                    stages.push(("author", quoted(author)));
                }
                if let Some(journal) = journal {
                    stages.push(("journal", quoted(journal)));
                }
                stages
            }
            FeedQuery::Freeform { query } => vec![("query", query.clone())],
        }
    }
}

/// Runs feed requests against the upstream API.
#[derive(Debug, Clone)]
pub struct FeedService {
    client: Client,
    api: ApiConfig,
    credentials: Credentials,
}

impl FeedService {
    pub fn new(api: ApiConfig, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tweetfeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, api, credentials))
    }

    pub fn with_client(client: Client, api: ApiConfig, credentials: Credentials) -> Self {
        Self {
            client,
            api,
            credentials,
        }
    }

    /// Acquire a token and run the searches for `query`.
    pub async fn fetch(&self, query: &FeedQuery, config: &HandlerConfig) -> Result<Vec<Value>> {
        let token = acquire_token(&self.client, &self.api, &self.credentials)
            .await
            .inspect_err(|e| error!(stage = "token", error = %e, "Token request failed"))?;

        let mut tweets: Vec<Value> = Vec::new();

        for (index, (stage, term)) in query.stages().into_iter().enumerate() {
            if index > 0 && tweets.len() >= config.fallback_threshold {
                info!(
                    stage,
                    collected = tweets.len(),
                    threshold = config.fallback_threshold,
                    "Enough results, skipping remaining searches"
                );
                break;
            }

            let found = search_tweets(&self.client, &self.api, &token, &term, config.encode_query)
                .await
                .inspect_err(|e| error!(stage, error = %e, "Search failed"))?;

            info!(stage, found = found.len(), "Search stage complete");
            tweets.extend(found);
        }

        Ok(tweets)
    }

    /// Handle one inbound request end to end.
    ///
    /// Missing parameters are rejected before any upstream call. Upstream
    /// failures abort or degrade according to `config.on_failure`.
    pub async fn respond(
        &self,
        params: &HashMap<String, String>,
        config: &HandlerConfig,
    ) -> FeedResponse {
        let query = match FeedQuery::from_params(config.mode, params) {
            Ok(query) => query,
            Err(e) => {
                warn!(mode = ?config.mode, "Rejected request with missing parameters");
                return FeedResponse::bad_request(e.payload());
            }
        };

        match self.fetch(&query, config).await {
            Ok(tweets) => {
                info!(total = tweets.len(), "Feed request complete");
                FeedResponse::ok(tweets)
            }
            Err(e) => match config.on_failure {
                FailurePolicy::Abort => FeedResponse::bad_request(e.payload()),
                FailurePolicy::Degrade => {
                    warn!(error = %e, "Returning empty result set after upstream failure");
                    FeedResponse::ok(Vec::new())
                }
            },
        }
    }
}
