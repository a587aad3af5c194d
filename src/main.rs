//! tweetfeed - tweets mentioning a publication
//!
//! ## Usage
//!
//! ### HTTP Server Mode
//! ```bash
//! TWITTER_SERVICE_KEY=... TWITTER_SECRET_KEY=... tweetfeed serve --port 3000
//! curl 'http://127.0.0.1:3000/tweets?t=Deep%20Learning&a=Yann%20LeCun&j=Nature'
//! ```
//!
//! ### One-shot Mode
//! ```bash
//! tweetfeed search --title "Deep Learning" --author "Yann LeCun" --journal Nature
//! tweetfeed search --query "#rustlang"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};
use tweetfeed::config::DEFAULT_FALLBACK_THRESHOLD;
use tweetfeed::server::{self, AppState};
use tweetfeed::{ApiConfig, Credentials, FeedService, HandlerConfig};

// ============================================================================
// CLI Definition
// ============================================================================

/// Search the Twitter API for tweets about a publication
#[derive(Parser)]
#[command(name = "tweetfeed")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Upstream API base URL (defaults to $TWITTER_API_BASE or https://api.twitter.com)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Keep issuing fallback searches while fewer results than this were found
    #[arg(long, global = true, default_value_t = DEFAULT_FALLBACK_THRESHOLD)]
    fallback_threshold: usize,

    /// Percent-encode freeform queries like title/author/journal ones
    #[arg(long, global = true)]
    encode_freeform: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Run a single request and print the JSON response
    Search {
        /// Publication title
        #[arg(short, long, conflicts_with = "query", required_unless_present = "query")]
        title: Option<String>,

        /// Author name (fallback search)
        #[arg(short, long, requires = "title")]
        author: Option<String>,

        /// Journal name (fallback search)
        #[arg(short, long, requires = "title")]
        journal: Option<String>,

        /// Raw freeform query
        #[arg(short, long)]
        query: Option<String>,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.log_json {
        fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let api = match &cli.api_base {
        Some(base) => ApiConfig::new(base),
        None => ApiConfig::from_env(),
    }
    .context("Invalid API configuration")?;
    let credentials = Credentials::from_env().context("Missing API credentials")?;
    let service = FeedService::new(api, credentials)?;

    let multi_field = HandlerConfig::multi_field().with_fallback_threshold(cli.fallback_threshold);
    let freeform = HandlerConfig::freeform()
        .with_fallback_threshold(cli.fallback_threshold)
        .with_encode_query(cli.encode_freeform);

    match cli.command {
        Commands::Serve { port, host } => {
            let state = AppState {
                service,
                multi_field,
                freeform,
            };
            run_server(host, port, state).await
        }
        Commands::Search {
            title,
            author,
            journal,
            query,
        } => {
            let mut params = HashMap::new();
            let config = match title {
                Some(title) => {
                    params.insert("t".to_string(), title);
                    if let Some(author) = author {
                        params.insert("a".to_string(), author);
                    }
                    if let Some(journal) = journal {
                        params.insert("j".to_string(), journal);
                    }
                    multi_field
                }
                None => {
                    if let Some(query) = query {
                        params.insert("q".to_string(), query);
                    }
                    freeform
                }
            };

            let response = service.respond(&params, &config).await;
            println!("{}", response.to_json()?);

            if !response.status.is_success() {
                anyhow::bail!("Request failed with status {}", response.status);
            }
            Ok(())
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

async fn run_server(host: String, port: u16, state: AppState) -> Result<()> {
    info!(host = %host, port = port, "Starting HTTP server");

    let app = server::router(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
