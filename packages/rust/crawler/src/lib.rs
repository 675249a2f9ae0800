//! Crawl capability for collectonce.
//!
//! This crate provides:
//! - [`CrawlCapability`]: the acquire-once, collect-per-keyword, dispose-once
//!   resource the batch orchestrator drives
//! - [`HttpCrawler`]: a link-following implementation bounded by
//!   `branches`/`depth` and paced by the configured delays
//! - [`Pacer`]: minimum-interval pacing between operations

pub mod engine;
pub mod pacing;

use std::future::Future;

use collectonce_shared::{CrawlResult, Result};

pub use engine::{HttpCrawler, expand_seed_template};
pub use pacing::Pacer;

/// A crawl resource that collects results one keyword at a time.
///
/// Implementations are built once per batch from the whole `CrawlSpec` and
/// are responsible for enforcing its traversal bounds and delays.
pub trait CrawlCapability {
    /// Collect everything reachable for `keyword`.
    ///
    /// `Ok(None)` means the keyword produced no data (soft failure);
    /// `Err` is a hard failure that aborts the batch.
    fn collect(
        &mut self,
        keyword: &str,
    ) -> impl Future<Output = Result<Option<CrawlResult>>> + Send;

    /// Release the resource. Consumes the handle, so it runs at most once.
    fn dispose(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;
}
