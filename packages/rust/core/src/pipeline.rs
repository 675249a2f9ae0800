//! End-to-end batch pipeline: spec → orchestrate → persist.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use collectonce_crawler::CrawlCapability;
use collectonce_shared::{CrawlSpec, RESULTS_DIR_NAME, Result};

use crate::orchestrator::run_batch;
use crate::persist::persist;

/// Options for [`collect_once`].
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory the batch artifact is written to.
    pub results_dir: PathBuf,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from(RESULTS_DIR_NAME),
        }
    }
}

/// Summary of a completed batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Path of the written artifact.
    pub path: PathBuf,
    /// Keywords that produced results, in order.
    pub keywords: Vec<String>,
    /// Keywords that yielded no data.
    pub skipped: Vec<String>,
    /// Total discovered items across all results.
    pub item_count: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// How a single keyword ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordOutcome {
    Collected { items: usize },
    Skipped,
    Failed,
}

/// Progress callback for reporting batch status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a keyword is collected.
    fn keyword_started(&self, keyword: &str, current: usize, total: usize);
    /// Called after a keyword was collected, skipped, or failed.
    fn keyword_finished(&self, keyword: &str, outcome: KeywordOutcome);
    /// Called when the batch has been persisted.
    fn done(&self, outcome: &BatchOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn keyword_started(&self, _keyword: &str, _current: usize, _total: usize) {}
    fn keyword_finished(&self, _keyword: &str, _outcome: KeywordOutcome) {}
    fn done(&self, _outcome: &BatchOutcome) {}
}

/// Forwards progress and remembers which keyword runs were skipped.
struct SkipLog<'a> {
    inner: &'a dyn ProgressReporter,
    skipped: Mutex<Vec<String>>,
}

impl<'a> SkipLog<'a> {
    fn new(inner: &'a dyn ProgressReporter) -> Self {
        Self {
            inner,
            skipped: Mutex::new(Vec::new()),
        }
    }

    fn into_skipped(self) -> Vec<String> {
        self.skipped.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProgressReporter for SkipLog<'_> {
    fn phase(&self, name: &str) {
        self.inner.phase(name);
    }

    fn keyword_started(&self, keyword: &str, current: usize, total: usize) {
        self.inner.keyword_started(keyword, current, total);
    }

    fn keyword_finished(&self, keyword: &str, outcome: KeywordOutcome) {
        if outcome == KeywordOutcome::Skipped {
            let mut skipped = self.skipped.lock().unwrap_or_else(|e| e.into_inner());
            skipped.push(keyword.to_string());
        }
        self.inner.keyword_finished(keyword, outcome);
    }

    fn done(&self, outcome: &BatchOutcome) {
        self.inner.done(outcome);
    }
}

/// Run the whole batch for `spec` and persist the aggregated results.
///
/// A hard keyword failure aborts before anything is written.
#[instrument(skip_all, fields(keywords = ?spec.keywords))]
pub async fn collect_once<C, F>(
    spec: &CrawlSpec,
    options: &BatchOptions,
    acquire: F,
    progress: &dyn ProgressReporter,
) -> Result<BatchOutcome>
where
    C: CrawlCapability,
    F: FnOnce(&CrawlSpec) -> Result<C>,
{
    let start = Instant::now();

    let log = SkipLog::new(progress);
    let results = run_batch(spec, acquire, &log).await?;
    let skipped = log.into_skipped();

    let keywords: Vec<String> = results.iter().map(|r| r.keyword.clone()).collect();
    let item_count = results.iter().map(|r| r.items.len()).sum();

    progress.phase("Saving results");
    let path = persist(&options.results_dir, results).await?;

    let outcome = BatchOutcome {
        path,
        keywords,
        skipped,
        item_count,
        elapsed: start.elapsed(),
    };

    info!(
        path = %outcome.path.display(),
        collected = outcome.keywords.len(),
        skipped = outcome.skipped.len(),
        items = outcome.item_count,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "batch complete"
    );

    progress.done(&outcome);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use collectonce_shared::BatchArtifact;

    use crate::testing::{Calls, FakeCrawler, Scripted, spec_with_keywords, temp_dir};

    #[tokio::test]
    async fn writes_artifact_without_skipped_keywords() {
        let dir = temp_dir("pipeline");
        let options = BatchOptions {
            results_dir: dir.clone(),
        };
        let spec = spec_with_keywords(&["k1", "k2", "k3"]);
        let calls = Arc::new(Calls::default());
        let script = [
            ("k1", Scripted::Items(2)),
            ("k2", Scripted::NoData),
            ("k3", Scripted::Items(3)),
        ];

        let outcome = collect_once(
            &spec,
            &options,
            |_| Ok(FakeCrawler::new(&script, calls.clone())),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(outcome.keywords, vec!["k1", "k3"]);
        assert_eq!(outcome.skipped, vec!["k2"]);
        assert_eq!(outcome.item_count, 5);
        assert!(outcome.path.starts_with(&dir));
        assert!(
            outcome
                .path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("k1,k3-")
        );

        let artifact: BatchArtifact =
            serde_json::from_str(&tokio::fs::read_to_string(&outcome.path).await.unwrap()).unwrap();
        assert_eq!(artifact.keywords, vec!["k1", "k3"]);
        assert_eq!(artifact.results.len(), 2);
        assert_eq!(calls.disposed(), 1);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn repeated_keyword_skip_is_reported() {
        let dir = temp_dir("pipeline-repeat");
        let options = BatchOptions {
            results_dir: dir.clone(),
        };
        let spec = spec_with_keywords(&["k1", "k1"]);
        let calls = Arc::new(Calls::default());
        let script = [("k1", Scripted::Items(2)), ("k1", Scripted::NoData)];

        let outcome = collect_once(
            &spec,
            &options,
            |_| Ok(FakeCrawler::new(&script, calls.clone())),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(outcome.keywords, vec!["k1"]);
        assert_eq!(outcome.skipped, vec!["k1"]);
        assert_eq!(outcome.item_count, 2);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn hard_failure_writes_nothing() {
        let dir = temp_dir("pipeline-abort");
        let options = BatchOptions {
            results_dir: dir.clone(),
        };
        let spec = spec_with_keywords(&["k1", "k2"]);
        let calls = Arc::new(Calls::default());
        let script = [("k1", Scripted::Items(1)), ("k2", Scripted::Fail)];

        let result = collect_once(
            &spec,
            &options,
            |_| Ok(FakeCrawler::new(&script, calls.clone())),
            &SilentProgress,
        )
        .await;

        assert!(result.is_err());
        assert!(!dir.exists());
        assert_eq!(calls.disposed(), 1);
    }
}
