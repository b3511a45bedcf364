//! # zapstats-core
//!
//! Core library for zapstats - response-time analytics for a WhatsApp
//! support CRM.
//!
//! This library provides:
//! - Paginated ingestion of the message log from the hosted backend
//! - Sender label normalization into a closed role set
//! - Per-conversation timeline reconstruction and reply matching
//! - Aggregation into the dashboard's three engagement metrics
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! One request flows through four sequential stages:
//! - **Ingestion:** fetch the trailing window page by page (`feed`)
//! - **Normalization:** map free-text sender labels to roles (`sender`)
//! - **Reconstruction:** replay each conversation lane once (`timeline`)
//! - **Aggregation:** reduce to three rounded scalars (`metrics`)
//!
//! The engine is a pure read-side aggregation: it never mutates the log,
//! caches nothing between requests, and degrades to zeroed metrics on
//! any ingestion failure.
//!
//! ## Example
//!
//! ```rust,no_run
//! use zapstats_core::{Config, FeedClient, StatsEngine};
//!
//! # async fn run() -> zapstats_core::Result<()> {
//! let config = Config::load()?;
//! let feed = FeedClient::new(&config.feed)?;
//! let engine = StatsEngine::new(feed).with_window_days(config.feed.window_days);
//! let report = engine.compute(None, false).await;
//! println!("{:?}", report.metrics);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use engine::{StatsEngine, StatsReport};
pub use error::{Error, Result};
pub use feed::FeedClient;
pub use sender::Sender;
pub use types::*;

// Public modules
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod logging;
pub mod metrics;
pub mod sender;
pub mod timeline;
pub mod types;
