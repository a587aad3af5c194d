//! Bearer token acquisition.
//!
//! Exchanges the service credentials for an application-only bearer token
//! (OAuth2 client-credentials grant). A token lives for a single request and
//! is never cached.

use crate::config::{ApiConfig, Credentials};
use crate::error::{FeedError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

const GRANT_TYPE_BODY: &str = "grant_type=client_credentials";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// `Authorization` header value for the token request: `Basic base64(key:secret)`.
pub fn basic_authorization(credentials: &Credentials) -> String {
    let raw = format!("{}:{}", credentials.service_key, credentials.secret_key);
    format!("Basic {}", BASE64.encode(raw))
}

/// Request a fresh bearer token.
pub async fn acquire_token(
    client: &Client,
    api: &ApiConfig,
    credentials: &Credentials,
) -> Result<String> {
    let url = api.token_url();
    debug!(url = %url, "Requesting bearer token");

    let response = client
        .post(&url)
        .header(AUTHORIZATION, basic_authorization(credentials))
        .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
        .body(GRANT_TYPE_BODY)
        .send()
        .await?;
    let status = response.status();

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), error = %error_text, "Token endpoint error");
        return Err(FeedError::api(status.as_u16(), &error_text));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| FeedError::Parse(format!("Failed to parse token response: {}", e)))?;

    if let Some(kind) = token.token_type.as_deref() {
        if !kind.eq_ignore_ascii_case("bearer") {
            warn!(token_type = kind, "Unexpected token type");
        }
    }

    token
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| FeedError::Parse("Token response has no access_token".to_string()))
}
