//! # tweetfeed
//!
//! Finds tweets mentioning a publication through the Twitter search API.
//!
//! ## Modules
//!
//! - [`config`] - Credentials, API location, handler presets
//! - [`token`] - Bearer token exchange
//! - [`search`] - Single search call
//! - [`feed`] - Validation, fallback searches, merge
//! - [`response`] - `{data}` / `{error}` envelope
//! - [`server`] - axum routes
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use tweetfeed::{ApiConfig, Credentials, FeedService, HandlerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = FeedService::new(ApiConfig::default(), Credentials::from_env()?)?;
//!     let params = HashMap::from([("t".to_string(), "Attention Is All You Need".to_string())]);
//!     let response = service.respond(&params, &HandlerConfig::multi_field()).await;
//!     println!("{}", response.to_json()?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod response;
pub mod search;
pub mod server;
pub mod token;

pub use config::{ApiConfig, Credentials, FailurePolicy, HandlerConfig, QueryMode};
pub use error::{FeedError, Result};
pub use feed::{FeedQuery, FeedService};
pub use response::{FeedBody, FeedResponse};
