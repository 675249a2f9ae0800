//! Batch artifact persistence.
//!
//! The artifact is written once per batch as pretty-printed JSON to
//! `<results_dir>/<keywords>-<date>.json`. Runs with the same keywords on the
//! same day overwrite each other.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use collectonce_shared::{BatchArtifact, CollectError, CrawlResult, Result};

/// Aggregate `results` stamped with the current time and write them to `dir`.
pub async fn persist(dir: &Path, results: Vec<CrawlResult>) -> Result<PathBuf> {
    persist_at(dir, results, Utc::now()).await
}

/// Like [`persist`], with an explicit timestamp.
pub async fn persist_at(
    dir: &Path,
    results: Vec<CrawlResult>,
    date: DateTime<Utc>,
) -> Result<PathBuf> {
    let artifact = BatchArtifact::new(results, date);
    write_artifact(dir, &artifact).await
}

/// Write an artifact atomically: temp file in `dir`, then rename over the target.
#[instrument(skip_all, fields(dir = %dir.display(), keywords = artifact.keywords.len()))]
pub async fn write_artifact(dir: &Path, artifact: &BatchArtifact) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| CollectError::io(dir, e))?;

    let file_name = artifact.file_name();
    let target = dir.join(&file_name);
    let temp = dir.join(format!(".{file_name}.{}.tmp", Uuid::now_v7()));

    let json = serde_json::to_string_pretty(artifact)?;
    write_then_rename(&temp, &target, json.as_bytes()).await?;

    info!(
        path = %target.display(),
        results = artifact.results.len(),
        "batch artifact written"
    );

    Ok(target)
}

/// Write `contents` to `temp` and move it over `target`. The temp file is
/// removed on any failure.
async fn write_then_rename(temp: &Path, target: &Path, contents: &[u8]) -> Result<()> {
    if let Err(e) = tokio::fs::write(temp, contents).await {
        discard(temp).await;
        return Err(CollectError::io(temp, e));
    }

    if let Err(e) = tokio::fs::rename(temp, target).await {
        discard(temp).await;
        return Err(CollectError::io(target, e));
    }

    Ok(())
}

async fn discard(temp: &Path) {
    if let Err(e) = tokio::fs::remove_file(temp).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %temp.display(), error = %e, "failed to remove temp file");
        }
    }
}
