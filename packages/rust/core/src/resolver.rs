//! Configuration source resolution.
//!
//! Three mutually exclusive sources are tried in priority order: CLI flags,
//! the `config.json` file, then the interactive prompt. The first source that
//! produces a configuration is used and later sources are never consulted.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use collectonce_shared::{
    CollectError, CrawlSpec, LogLevel, RawCrawlSpec, RawDelay, Result, normalize, parse_config,
};

use crate::logging::LevelSink;

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// One configuration source.
#[async_trait]
pub trait ConfigProvider: Send {
    /// Short source name for logs.
    fn name(&self) -> &'static str;

    /// Produce a configuration, or `None` when this source is not available.
    async fn try_resolve(&mut self) -> Result<Option<RawCrawlSpec>>;
}

// ---------------------------------------------------------------------------
// CLI flags
// ---------------------------------------------------------------------------

/// Crawl-related command-line values, independent of the argument parser.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub keywords: Option<Vec<String>>,
    pub seeds: Option<Vec<String>>,
    pub branches: Option<i64>,
    pub depth: Option<i64>,
    pub delay_video: Option<u64>,
    pub delay_seed: Option<u64>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub silent: bool,
    pub verbose: bool,
}

/// Selected whenever a keyword list was passed on the command line.
pub struct CliArgsProvider {
    args: CliArgs,
}

impl CliArgsProvider {
    pub fn new(args: CliArgs) -> Self {
        Self { args }
    }
}

#[async_trait]
impl ConfigProvider for CliArgsProvider {
    fn name(&self) -> &'static str {
        "cli"
    }

    async fn try_resolve(&mut self) -> Result<Option<RawCrawlSpec>> {
        let Some(keywords) = self.args.keywords.clone() else {
            return Ok(None);
        };
        let args = &self.args;

        Ok(Some(RawCrawlSpec {
            keywords: Some(keywords),
            seeds: args.seeds.clone(),
            branches: args.branches,
            depth: args.depth,
            delay: Some(RawDelay {
                video: args.delay_video,
                seed: args.delay_seed,
            }),
            country: args.country.clone(),
            language: args.language.clone(),
            log_level: LogLevel::from_flags(args.silent, args.verbose),
        }))
    }
}

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

/// Reads a JSON configuration file. Unreadable or corrupt files count as absent.
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConfigProvider for FileProvider {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn try_resolve(&mut self) -> Result<Option<RawCrawlSpec>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "config file unavailable");
                return Ok(None);
            }
        };

        match parse_config(&content) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) => {
                // The log level is not applied yet, so stay below the default filter.
                debug!(path = %self.path.display(), error = %e, "ignoring corrupt config file");
                Ok(None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Interactive prompt
// ---------------------------------------------------------------------------

/// Asks a human for every configuration field.
pub trait Prompter: Send + Sync {
    fn prompt(&self) -> Result<RawCrawlSpec>;
}

/// Last-resort source backed by a [`Prompter`]. A prompt error aborts the run.
pub struct PromptProvider {
    prompter: Arc<dyn Prompter>,
}

impl PromptProvider {
    pub fn new(prompter: Arc<dyn Prompter>) -> Self {
        Self { prompter }
    }
}

#[async_trait]
impl ConfigProvider for PromptProvider {
    fn name(&self) -> &'static str {
        "prompt"
    }

    async fn try_resolve(&mut self) -> Result<Option<RawCrawlSpec>> {
        let prompter = Arc::clone(&self.prompter);
        let raw = tokio::task::spawn_blocking(move || prompter.prompt())
            .await
            .map_err(|e| CollectError::config(format!("prompt task failed: {e}")))??;
        Ok(Some(raw))
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Tries providers in priority order and normalizes the first hit.
pub struct Resolver {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl Resolver {
    pub fn new(providers: Vec<Box<dyn ConfigProvider>>) -> Self {
        Self { providers }
    }

    /// CLI flags, then `config_path`, then the prompt.
    pub fn standard(args: CliArgs, config_path: impl Into<PathBuf>, prompter: Arc<dyn Prompter>) -> Self {
        Self::new(vec![
            Box::new(CliArgsProvider::new(args)),
            Box::new(FileProvider::new(config_path)),
            Box::new(PromptProvider::new(prompter)),
        ])
    }

    /// Resolve the run's crawl spec.
    ///
    /// Applies the effective log level to `sink` before anything else is
    /// reported. Returns `Ok(None)` when no source yields usable keywords,
    /// and a validation error when the chosen configuration is out of bounds.
    #[instrument(skip_all)]
    pub async fn resolve(&mut self, sink: &dyn LevelSink) -> Result<Option<CrawlSpec>> {
        let mut chosen: Option<(&'static str, RawCrawlSpec)> = None;
        for provider in &mut self.providers {
            if let Some(raw) = provider.try_resolve().await? {
                chosen = Some((provider.name(), raw));
                break;
            }
            debug!(source = provider.name(), "configuration source not available");
        }

        let level = chosen
            .as_ref()
            .and_then(|(_, raw)| raw.log_level)
            .unwrap_or_default();
        sink.apply(level);

        let Some((source, raw)) = chosen else {
            info!("no configuration source available, nothing to crawl");
            return Ok(None);
        };

        if !raw.has_keywords() {
            info!(source, "configuration has no keywords, nothing to crawl");
            return Ok(None);
        }

        let spec = normalize(raw)?;
        info!(
            source,
            keywords = spec.keywords.len(),
            seeds = spec.seeds.len(),
            branches = spec.branches,
            depth = spec.depth,
            %level,
            "configuration resolved"
        );
        Ok(Some(spec))
    }
}
