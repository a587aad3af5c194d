//! Tweet search client.
//!
//! One call to `GET /1.1/search/tweets.json`. Result records are passed
//! through untouched as JSON values; nothing in them is interpreted here.

use crate::config::ApiConfig;
use crate::error::{FeedError, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    statuses: Vec<Value>,
}

/// Wrap a fallback term in double quotes for an exact-phrase search.
pub fn quoted(term: &str) -> String {
    format!("\"{}\"", term)
}

/// Escapes `urlencoding` produces that `encodeURIComponent` does not.
const URI_COMPONENT_UNRESERVED: &[(&str, &str)] = &[
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%2A", "*"),
];

/// Value sent as `q`, percent-encoded first when `encode` is set.
///
/// Encoding leaves `!'()*` as-is, like `encodeURIComponent`. The HTTP client
/// form-encodes query parameters as well, so an encoded query reaches the
/// upstream encoded twice.
pub fn prepare_query(raw: &str, encode: bool) -> Cow<'_, str> {
    if !encode {
        return Cow::Borrowed(raw);
    }

    let encoded = urlencoding::encode(raw);
    if !URI_COMPONENT_UNRESERVED
        .iter()
        .any(|(escaped, _)| encoded.contains(escaped))
    {
        return encoded;
    }

    let mut restored = encoded.into_owned();
    for (escaped, plain) in URI_COMPONENT_UNRESERVED {
        restored = restored.replace(escaped, plain);
    }
    Cow::Owned(restored)
}

/// Run one search and return the upstream `statuses` in order.
pub async fn search_tweets(
    client: &Client,
    api: &ApiConfig,
    token: &str,
    query: &str,
    encode: bool,
) -> Result<Vec<Value>> {
    let q = prepare_query(query, encode);
    debug!(query = query, q = %q, "Searching tweets");

    let response = client
        .get(api.search_url())
        .header(AUTHORIZATION, format!("Bearer {}", token))
        .query(&[("q", q.as_ref())])
        .send()
        .await?;
    let status = response.status();

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), error = %error_text, "Search endpoint error");
        return Err(FeedError::api(status.as_u16(), &error_text));
    }

    let data: SearchResponse = response
        .json()
        .await
        .map_err(|e| FeedError::Parse(format!("Failed to parse search response: {}", e)))?;

    debug!(found = data.statuses.len(), "Search completed");
    Ok(data.statuses)
}
