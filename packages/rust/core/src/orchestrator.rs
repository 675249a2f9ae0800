//! Batch orchestration over a single crawl resource.
//!
//! ```text
//! Idle → Acquiring → (Collecting → Collected | Skipped)* → Releasing → Done
//! ```
//!
//! The resource is acquired once from the whole spec, drives every keyword
//! sequentially, and is released exactly once on every exit path that
//! returns, including a hard failure part-way through the batch.

use tracing::{debug, error, info, instrument, warn};

use collectonce_crawler::CrawlCapability;
use collectonce_shared::{CollectError, CrawlResult, CrawlSpec, Result};

use crate::pipeline::{KeywordOutcome, ProgressReporter};

/// Lifecycle stage of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Acquiring,
    Collecting,
    Releasing,
    Done,
}

fn advance(state: &mut BatchState, next: BatchState) {
    debug!(from = ?state, to = ?next, "batch state");
    *state = next;
}

/// Run every keyword of `spec` through one crawl resource built by `acquire`.
///
/// Keywords that yield no data are skipped. The first hard failure stops the
/// batch and is returned (tagged with its keyword) after the resource has
/// been released. A failing release after a clean batch is logged and the
/// collected results are kept.
#[instrument(skip_all, fields(keywords = spec.keywords.len()))]
pub async fn run_batch<C, F>(
    spec: &CrawlSpec,
    acquire: F,
    progress: &dyn ProgressReporter,
) -> Result<Vec<CrawlResult>>
where
    C: CrawlCapability,
    F: FnOnce(&CrawlSpec) -> Result<C>,
{
    let mut state = BatchState::Idle;

    advance(&mut state, BatchState::Acquiring);
    progress.phase("Starting crawler");
    let mut crawler = acquire(spec)?;

    advance(&mut state, BatchState::Collecting);
    let collected = collect_all(&mut crawler, spec, progress).await;

    advance(&mut state, BatchState::Releasing);
    progress.phase("Releasing crawler");
    let released = crawler.dispose().await;

    advance(&mut state, BatchState::Done);
    match (collected, released) {
        (Ok(results), Ok(())) => Ok(results),
        (Ok(results), Err(e)) => {
            warn!(error = %e, "crawler release failed, keeping collected results");
            Ok(results)
        }
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release_err)) => {
            warn!(error = %release_err, "crawler release failed after aborted batch");
            Err(e)
        }
    }
}

async fn collect_all<C: CrawlCapability>(
    crawler: &mut C,
    spec: &CrawlSpec,
    progress: &dyn ProgressReporter,
) -> Result<Vec<CrawlResult>> {
    let total = spec.keywords.len();
    let mut results = Vec::with_capacity(total);

    for (i, keyword) in spec.keywords.iter().enumerate() {
        progress.keyword_started(keyword, i + 1, total);

        match crawler.collect(keyword).await {
            Ok(Some(result)) => {
                let items = result.items.len();
                info!(keyword = %keyword, items, "collected");
                progress.keyword_finished(keyword, KeywordOutcome::Collected { items });
                results.push(result);
            }
            Ok(None) => {
                warn!(keyword = %keyword, "no data collected, skipping keyword");
                progress.keyword_finished(keyword, KeywordOutcome::Skipped);
            }
            Err(e) => {
                error!(
                    keyword = %keyword,
                    position = i + 1,
                    total,
                    error = %e,
                    "collection failed, aborting batch"
                );
                progress.keyword_finished(keyword, KeywordOutcome::Failed);
                return Err(CollectError::keyword(keyword.as_str(), "collection", e));
            }
        }
    }

    Ok(results)
}
