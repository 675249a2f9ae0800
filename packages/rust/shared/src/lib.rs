//! Shared types, error model, and configuration for collectonce.
//!
//! This crate is the foundation depended on by all other collectonce crates.
//! It provides:
//! - [`CollectError`]: the unified error type
//! - Configuration ([`RawCrawlSpec`], [`CrawlSpec`], [`normalize`])
//! - Result types ([`CrawlResult`], [`BatchArtifact`])

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    CONFIG_FILE_NAME, CrawlSpec, DEFAULT_BRANCHES, DEFAULT_DEPTH, Delay, LogLevel,
    RESULTS_DIR_NAME, RawCrawlSpec, RawDelay, normalize, parse_config,
};
pub use error::{CollectError, Result};
pub use types::{ARTIFACT_DATE_FORMAT, BatchArtifact, CrawlResult, CrawledItem, FetchFailure};
