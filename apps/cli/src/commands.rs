//! CLI definition, tracing setup, and the batch command.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use collectonce_core::logging::{LevelSink, filter_directive};
use collectonce_core::pipeline::{
    BatchOptions, BatchOutcome, KeywordOutcome, ProgressReporter, collect_once,
};
use collectonce_core::resolver::{CliArgs, Prompter, Resolver};
use collectonce_crawler::HttpCrawler;
use collectonce_shared::{CONFIG_FILE_NAME, LogLevel, RESULTS_DIR_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{EnvFilter, Registry, reload};

use crate::prompt::DialoguerPrompt;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// collectonce: crawl a batch of keywords from seed pages and save the results.
///
/// Passing `--keywords` selects command-line configuration. Otherwise the
/// config file is read, and if that is missing or unreadable you are prompted.
#[derive(Parser, Debug)]
#[command(
    name = "collectonce",
    version,
    about = "Crawl a batch of keywords from seed pages and save the results as JSON.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Keywords to crawl, in order (comma-separated).
    #[arg(short, long, value_delimiter = ',', num_args = 1..)]
    pub keywords: Option<Vec<String>>,

    /// Seed URL templates; `{keyword}`, `{country}` and `{language}` are substituted.
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub seeds: Option<Vec<String>>,

    /// Maximum links followed per page.
    #[arg(long, allow_negative_numbers = true)]
    pub branches: Option<i64>,

    /// Expansion levels below each seed's direct links.
    #[arg(long, allow_negative_numbers = true)]
    pub depth: Option<i64>,

    /// Minimum milliseconds between item fetches.
    #[arg(long)]
    pub delay_video: Option<u64>,

    /// Minimum milliseconds between seed expansions.
    #[arg(long)]
    pub delay_seed: Option<u64>,

    /// Country hint (e.g. SE).
    #[arg(long)]
    pub country: Option<String>,

    /// Language hint (e.g. sv).
    #[arg(long)]
    pub language: Option<String>,

    /// Suppress all log output. Wins over --verbose.
    #[arg(long)]
    pub silent: bool,

    /// Debug-level log output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file read when --keywords is absent.
    #[arg(long, env = "COLLECTONCE_CONFIG", default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Directory the batch artifact is written to.
    #[arg(long, default_value = RESULTS_DIR_NAME)]
    pub out_dir: PathBuf,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// Crawl-related flags, handed to the CLI configuration source.
    pub(crate) fn crawl_args(&self) -> CliArgs {
        CliArgs {
            keywords: self.keywords.clone(),
            seeds: self.seeds.clone(),
            branches: self.branches,
            depth: self.depth,
            delay_video: self.delay_video,
            delay_seed: self.delay_seed,
            country: self.country.clone(),
            language: self.language.clone(),
            silent: self.silent,
            verbose: self.verbose,
        }
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Reload handle for the global level filter.
pub(crate) struct LogHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    /// `RUST_LOG` was set; it takes precedence over the resolved level.
    env_override: bool,
}

impl LevelSink for LogHandle {
    fn apply(&self, level: LogLevel) {
        if self.env_override {
            return;
        }
        if let Err(e) = self.handle.reload(EnvFilter::new(filter_directive(level))) {
            tracing::warn!(error = %e, %level, "failed to apply log level");
        }
    }
}

/// Install the global subscriber at the default level.
///
/// The level is replaced through the returned handle once configuration has
/// been resolved.
pub(crate) fn init_tracing(cli: &Cli) -> LogHandle {
    use tracing_subscriber::{Layer, fmt, prelude::*};

    let from_env = EnvFilter::try_from_default_env().ok();
    let env_override = from_env.is_some();
    let filter =
        from_env.unwrap_or_else(|| EnvFilter::new(filter_directive(LogLevel::default())));
    let (filter_layer, handle) = reload::Layer::new(filter);

    let fmt_layer = match cli.log_format {
        LogFormat::Text => fmt::layer().with_target(false).boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    LogHandle {
        handle,
        env_override,
    }
}

// ---------------------------------------------------------------------------
// Batch command
// ---------------------------------------------------------------------------

/// Resolve configuration, crawl every keyword, and save the batch.
pub(crate) async fn run(cli: Cli, logs: LogHandle) -> Result<()> {
    let prompter: Arc<dyn Prompter> = Arc::new(DialoguerPrompt);
    let mut resolver = Resolver::standard(cli.crawl_args(), &cli.config, prompter);

    let Some(spec) = resolver.resolve(&logs).await? else {
        return Ok(());
    };

    let quiet = spec.log_level == Some(LogLevel::Silent);
    let options = BatchOptions {
        results_dir: cli.out_dir.clone(),
    };

    info!(keywords = ?spec.keywords, "starting batch");

    let reporter = CliProgress::new(quiet);
    let outcome = collect_once(&spec, &options, HttpCrawler::new, &reporter).await?;

    if !quiet {
        println!();
        println!("  Batch saved!");
        println!("  Collected: {}", outcome.keywords.join(", "));
        if !outcome.skipped.is_empty() {
            println!("  Skipped:   {}", outcome.skipped.join(", "));
        }
        println!("  Items:     {}", outcome.item_count);
        println!("  Path:      {}", outcome.path.display());
        println!("  Time:      {:.1}s", outcome.elapsed.as_secs_f64());
        println!();
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new(quiet: bool) -> Self {
        if quiet {
            return Self {
                spinner: ProgressBar::hidden(),
            };
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn keyword_started(&self, keyword: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Collecting [{current}/{total}] {keyword}"));
    }

    fn keyword_finished(&self, keyword: &str, outcome: KeywordOutcome) {
        let line = match outcome {
            KeywordOutcome::Collected { items } => format!("✔ {keyword}: {items} item(s)"),
            KeywordOutcome::Skipped => format!("– {keyword}: no data, skipped"),
            KeywordOutcome::Failed => format!("✘ {keyword}: failed"),
        };
        self.spinner.println(line);
    }

    fn done(&self, _outcome: &BatchOutcome) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_flag_is_comma_separated() {
        let cli = Cli::try_parse_from([
            "collectonce",
            "--keywords",
            "foo,bar",
            "--seeds",
            "https://videos.example.com/results?q={keyword}",
            "--branches",
            "3",
            "--depth",
            "0",
            "--delay-video",
            "1500",
            "--delay-seed",
            "200",
            "--country",
            "SE",
            "--language",
            "sv",
        ])
        .unwrap();

        let args = cli.crawl_args();
        assert_eq!(args.keywords, Some(vec!["foo".to_string(), "bar".to_string()]));
        assert_eq!(args.branches, Some(3));
        assert_eq!(args.depth, Some(0));
        assert_eq!(args.delay_video, Some(1500));
        assert_eq!(args.delay_seed, Some(200));
        assert_eq!(args.country.as_deref(), Some("SE"));
        assert!(!args.silent && !args.verbose);
    }

    #[test]
    fn negative_depth_parses_for_validation() {
        let cli = Cli::try_parse_from(["collectonce", "-k", "foo", "--depth", "-1"]).unwrap();
        assert_eq!(cli.depth, Some(-1));
    }

    #[test]
    fn defaults_without_flags() {
        let cli = Cli::try_parse_from(["collectonce"]).unwrap();
        assert!(cli.keywords.is_none());
        assert_eq!(cli.out_dir, PathBuf::from("results"));
        assert!(matches!(cli.log_format, LogFormat::Text));
    }

    #[test]
    fn silent_and_verbose_both_accepted() {
        let cli = Cli::try_parse_from(["collectonce", "-k", "foo", "--silent", "--verbose"]).unwrap();
        let args = cli.crawl_args();
        assert!(args.silent && args.verbose);
    }
}
