//! Crawl result and batch artifact types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `chrono` format for the calendar-date part of an artifact file name
/// (e.g. `Sun Oct 18 2026`).
pub const ARTIFACT_DATE_FORMAT: &str = "%a %b %d %Y";

// ---------------------------------------------------------------------------
// CrawlResult
// ---------------------------------------------------------------------------

/// An item discovered while expanding a seed for one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawledItem {
    /// Item URL.
    pub url: String,
    /// Title extracted from the item page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The seed URL this item was reached from.
    pub seed: String,
    /// Expansion level: 0 for items linked directly from the seed.
    pub level: u32,
    /// URL of the page that linked to this item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// A fetch that failed without aborting the keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub url: String,
    pub message: String,
}

/// Output of one successful keyword collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    /// The keyword this result was collected for.
    pub keyword: String,
    /// When collection for this keyword finished.
    pub collected_at: DateTime<Utc>,
    /// Discovered items, in discovery order.
    pub items: Vec<CrawledItem>,
    /// Fetches that failed along the way.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FetchFailure>,
}

// ---------------------------------------------------------------------------
// BatchArtifact
// ---------------------------------------------------------------------------

/// The single JSON document written at the end of a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchArtifact {
    /// Time of persistence.
    pub date: DateTime<Utc>,
    /// Keywords that produced a result, in result order.
    pub keywords: Vec<String>,
    pub results: Vec<CrawlResult>,
}

impl BatchArtifact {
    /// Build the artifact for `results`, stamped with `date`.
    pub fn new(results: Vec<CrawlResult>, date: DateTime<Utc>) -> Self {
        let keywords = results.iter().map(|r| r.keyword.clone()).collect();
        Self {
            date,
            keywords,
            results,
        }
    }

    /// Deterministic file name: `<comma-joined keywords>-<calendar date>.json`.
    ///
    /// Path separators, NUL and a leading dot in the keyword part are replaced
    /// with `_`, so the name is always a single visible entry of the results
    /// directory. The artifact's `keywords` field keeps the original text.
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}.json",
            file_name_component(&self.keywords.join(",")),
            self.date.format(ARTIFACT_DATE_FORMAT)
        )
    }
}

fn file_name_component(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    if name.starts_with('.') {
        name.replace_range(..1, "_");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn result_for(keyword: &str) -> CrawlResult {
        CrawlResult {
            keyword: keyword.into(),
            collected_at: Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
            items: vec![CrawledItem {
                url: format!("https://videos.example.com/watch/{keyword}"),
                title: Some(format!("All about {keyword}")),
                seed: "https://videos.example.com/".into(),
                level: 0,
                parent: None,
            }],
            errors: vec![],
        }
    }

    #[test]
    fn artifact_projects_keywords_in_result_order() {
        let date = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let artifact = BatchArtifact::new(vec![result_for("k1"), result_for("k3")], date);
        assert_eq!(artifact.keywords, vec!["k1", "k3"]);
        assert_eq!(artifact.results.len(), 2);
    }

    #[test]
    fn artifact_file_name() {
        let date = Utc.with_ymd_and_hms(2026, 10, 18, 23, 59, 59).unwrap();
        let artifact = BatchArtifact::new(vec![result_for("foo"), result_for("bar")], date);
        assert_eq!(artifact.file_name(), "foo,bar-Sun Oct 18 2026.json");
    }

    #[test]
    fn file_name_stays_inside_results_dir() {
        let date = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();

        let artifact = BatchArtifact::new(vec![result_for("AC/DC"), result_for("24/7")], date);
        assert_eq!(artifact.file_name(), "AC_DC,24_7-Sun Oct 18 2026.json");
        assert_eq!(artifact.keywords, vec!["AC/DC", "24/7"]);

        let artifact = BatchArtifact::new(vec![result_for("/etc/passwd")], date);
        assert_eq!(artifact.file_name(), "_etc_passwd-Sun Oct 18 2026.json");

        let artifact = BatchArtifact::new(vec![result_for("..\\up")], date);
        assert_eq!(artifact.file_name(), "_._up-Sun Oct 18 2026.json");
    }

    #[test]
    fn crawl_result_uses_camel_case_keys() {
        let json = serde_json::to_value(result_for("rust")).expect("serialize");
        assert!(json.get("collectedAt").is_some());
        assert!(json.get("errors").is_none());
        assert!(json["items"][0].get("parent").is_none());
    }
}
