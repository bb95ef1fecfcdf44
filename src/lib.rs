//! X Likes Exporter - export the posts a user has liked on X (Twitter)
//!
//! This library drives the web client's GraphQL `Likes` timeline with a
//! logged-in browser session and turns the result into local files.
//!
//! # Features
//!
//! - Cursor pagination with rate-limit aware retries
//! - Deduplicated, ordered record collection
//! - Checkpoints for resuming interrupted runs
//! - Concurrent media downloads with optional photo optimization
//! - JSON, CSV, Markdown, HTML and Excel exports
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use x_likes_exporter::api::load_cookies;
//! use x_likes_exporter::{Config, CredentialContext, FetchEngine, Shutdown, XApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (config, _) = Config::load_or_default(Path::new("config.toml"))?;
//!     let cookies = load_cookies(Path::new("cookies.json"))?;
//!     let credentials = CredentialContext::with_bearer(&cookies, &config.auth.bearer_token)?;
//!     let api = XApi::new(credentials, config.client_options())?;
//!
//!     let mut engine = FetchEngine::new(api, config.fetch_options(), Shutdown::new());
//!     let outcome = engine.run("12345", 20, false, None).await?;
//!     println!("{} liked posts", outcome.records.len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod export;
pub mod fetch;
pub mod fs;
pub mod output;
pub mod record;
pub mod shutdown;

// Re-exports for convenience
pub use api::{CredentialContext, XApi};
pub use config::{Config, ExportFormat};
pub use download::MediaDownloader;
pub use error::{Error, Result};
pub use fetch::{FetchEngine, FetchOptions, FetchOutcome, FetchReport, LikesSource};
pub use record::{Record, RecordCollection};
pub use shutdown::Shutdown;
