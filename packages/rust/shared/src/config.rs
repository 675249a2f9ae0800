//! Crawl configuration model for collectonce.
//!
//! A configuration arrives as a lenient [`RawCrawlSpec`] (from CLI flags,
//! `config.json`, or the interactive prompt) and is turned into the canonical
//! [`CrawlSpec`] by [`normalize`]. Only a normalized spec reaches the crawler.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CollectError, Result};

/// Well-known configuration file, relative to the working directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Directory batch artifacts are written to.
pub const RESULTS_DIR_NAME: &str = "results";

/// Fan-out used when a configuration does not set `branches`.
pub const DEFAULT_BRANCHES: u32 = 5;

/// Traversal depth used when a configuration does not set `depth`.
pub const DEFAULT_DEPTH: u32 = 1;

// ---------------------------------------------------------------------------
// LogLevel
// ---------------------------------------------------------------------------

/// Process-wide logging verbosity requested by a configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No log output at all.
    Silent,
    /// Debug-level output.
    Verbose,
    /// Informational output (the default).
    #[default]
    Result,
}

impl LogLevel {
    /// Derive a level from the CLI `--silent` / `--verbose` toggles.
    ///
    /// `silent` wins when both are set; neither yields `None` so that the
    /// default informational level applies.
    pub fn from_flags(silent: bool, verbose: bool) -> Option<Self> {
        if silent {
            Some(Self::Silent)
        } else if verbose {
            Some(Self::Verbose)
        } else {
            None
        }
    }

    /// All levels, in the order offered by the interactive prompt.
    pub const ALL: [LogLevel; 3] = [Self::Result, Self::Verbose, Self::Silent];

    /// Lowercase name as it appears in `config.json`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Silent => "silent",
            Self::Verbose => "verbose",
            Self::Result => "result",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Raw (unvalidated) configuration
// ---------------------------------------------------------------------------

/// Raw per-phase delays in milliseconds, as found in `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDelay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Configuration as supplied by a source, before validation.
///
/// Every field is optional and the bounds are signed so that out-of-range
/// values are reported by [`normalize`] rather than by the JSON parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCrawlSpec {
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub seeds: Option<Vec<String>>,
    #[serde(default)]
    pub branches: Option<i64>,
    #[serde(default)]
    pub depth: Option<i64>,
    #[serde(default)]
    pub delay: Option<RawDelay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl RawCrawlSpec {
    /// Whether this source carries at least one non-blank keyword.
    pub fn has_keywords(&self) -> bool {
        self.keywords
            .as_ref()
            .is_some_and(|kws| kws.iter().any(|k| !k.trim().is_empty()))
    }
}

/// Parse a `config.json` document.
pub fn parse_config(content: &str) -> Result<RawCrawlSpec> {
    serde_json::from_str(content)
        .map_err(|e| CollectError::config(format!("failed to parse config: {e}")))
}

// ---------------------------------------------------------------------------
// Canonical configuration
// ---------------------------------------------------------------------------

/// Minimum waits between consecutive fetch operations of each phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delay {
    /// Wait between consecutive item (video) fetches.
    #[serde(with = "duration_ms")]
    pub video: Duration,
    /// Wait between consecutive seed expansions.
    #[serde(with = "duration_ms")]
    pub seed: Duration,
}

/// Canonical, validated crawl specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSpec {
    /// Keywords, crawled once each in this order.
    pub keywords: Vec<String>,
    /// Seed URL templates traversal starts from.
    pub seeds: Vec<String>,
    /// Maximum fan-out per traversal level.
    pub branches: u32,
    /// Maximum number of expansion levels below a seed's direct items.
    pub depth: u32,
    pub delay: Delay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl From<CrawlSpec> for RawCrawlSpec {
    fn from(spec: CrawlSpec) -> Self {
        Self {
            keywords: Some(spec.keywords),
            seeds: Some(spec.seeds),
            branches: Some(i64::from(spec.branches)),
            depth: Some(i64::from(spec.depth)),
            delay: Some(RawDelay {
                video: Some(duration_to_ms(spec.delay.video)),
                seed: Some(duration_to_ms(spec.delay.seed)),
            }),
            country: spec.country,
            language: spec.language,
            log_level: spec.log_level,
        }
    }
}

/// Validate a raw configuration and fill its defaults.
///
/// Pure and idempotent. Reports the first violated constraint, checked in
/// the order: keywords, seeds, branches, depth.
pub fn normalize(raw: RawCrawlSpec) -> Result<CrawlSpec> {
    // Keywords are kept verbatim; they feed the query and the artifact name.
    let keywords = raw.keywords.unwrap_or_default();
    if keywords.is_empty() {
        return Err(CollectError::validation("keyword list is empty"));
    }
    if let Some(pos) = keywords.iter().position(|k| k.trim().is_empty()) {
        return Err(CollectError::validation(format!(
            "keyword #{} is blank",
            pos + 1
        )));
    }

    let seeds = trimmed(raw.seeds.unwrap_or_default());
    if seeds.is_empty() {
        return Err(CollectError::validation("seed list is empty"));
    }
    if let Some(pos) = seeds.iter().position(String::is_empty) {
        return Err(CollectError::validation(format!("seed #{} is blank", pos + 1)));
    }

    let branches = raw.branches.unwrap_or(i64::from(DEFAULT_BRANCHES));
    if branches < 1 {
        return Err(CollectError::validation(format!(
            "branches must be at least 1, got {branches}"
        )));
    }
    let branches = u32::try_from(branches)
        .map_err(|_| CollectError::validation(format!("branches {branches} is too large")))?;

    let depth = raw.depth.unwrap_or(i64::from(DEFAULT_DEPTH));
    if depth < 0 {
        return Err(CollectError::validation(format!(
            "depth must not be negative, got {depth}"
        )));
    }
    let depth = u32::try_from(depth)
        .map_err(|_| CollectError::validation(format!("depth {depth} is too large")))?;

    let raw_delay = raw.delay.unwrap_or_default();
    let delay = Delay {
        video: Duration::from_millis(raw_delay.video.unwrap_or(0)),
        seed: Duration::from_millis(raw_delay.seed.unwrap_or(0)),
    };

    Ok(CrawlSpec {
        keywords,
        seeds,
        branches,
        depth,
        delay,
        country: non_blank(raw.country),
        language: non_blank(raw.language),
        log_level: raw.log_level,
    })
}

fn trimmed(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.trim().to_string()).collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn duration_to_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(super::duration_to_ms(*d))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
