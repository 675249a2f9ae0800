//! Interactive configuration prompt.

use collectonce_core::resolver::Prompter;
use collectonce_shared::{
    CollectError, DEFAULT_BRANCHES, DEFAULT_DEPTH, LogLevel, RawCrawlSpec, RawDelay, Result,
};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};

/// Asks for every crawl field on the terminal.
pub(crate) struct DialoguerPrompt;

impl Prompter for DialoguerPrompt {
    fn prompt(&self) -> Result<RawCrawlSpec> {
        let theme = ColorfulTheme::default();

        let keywords: String = Input::with_theme(&theme)
            .with_prompt("Keywords (comma-separated)")
            .validate_with(|input: &String| non_empty_list(input, "enter at least one keyword"))
            .interact_text()
            .map_err(prompt_error)?;

        let seeds: String = Input::with_theme(&theme)
            .with_prompt("Seed URLs (comma-separated, {keyword} is substituted)")
            .validate_with(|input: &String| non_empty_list(input, "enter at least one seed"))
            .interact_text()
            .map_err(prompt_error)?;

        let branches: i64 = Input::with_theme(&theme)
            .with_prompt("Branches per level")
            .default(i64::from(DEFAULT_BRANCHES))
            .validate_with(|n: &i64| if *n >= 1 { Ok(()) } else { Err("must be at least 1") })
            .interact_text()
            .map_err(prompt_error)?;

        let depth: i64 = Input::with_theme(&theme)
            .with_prompt("Depth")
            .default(i64::from(DEFAULT_DEPTH))
            .validate_with(|n: &i64| if *n >= 0 { Ok(()) } else { Err("must not be negative") })
            .interact_text()
            .map_err(prompt_error)?;

        let delay_video: u64 = Input::with_theme(&theme)
            .with_prompt("Delay between videos (ms)")
            .default(0)
            .interact_text()
            .map_err(prompt_error)?;

        let delay_seed: u64 = Input::with_theme(&theme)
            .with_prompt("Delay between seeds (ms)")
            .default(0)
            .interact_text()
            .map_err(prompt_error)?;

        let country: String = Input::with_theme(&theme)
            .with_prompt("Country (optional)")
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;

        let language: String = Input::with_theme(&theme)
            .with_prompt("Language (optional)")
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;

        let levels: Vec<&str> = LogLevel::ALL.iter().map(LogLevel::as_str).collect();
        let level = Select::with_theme(&theme)
            .with_prompt("Log level")
            .items(&levels)
            .default(0)
            .interact()
            .map_err(prompt_error)?;

        Ok(RawCrawlSpec {
            keywords: Some(split_list(&keywords)),
            seeds: Some(split_list(&seeds)),
            branches: Some(branches),
            depth: Some(depth),
            delay: Some(RawDelay {
                video: Some(delay_video),
                seed: Some(delay_seed),
            }),
            country: optional(country),
            language: optional(language),
            log_level: Some(LogLevel::ALL[level]),
        })
    }
}

fn prompt_error(e: dialoguer::Error) -> CollectError {
    CollectError::config(format!("interactive prompt failed: {e}"))
}

/// Split a comma-separated answer, dropping blank entries.
fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn non_empty_list(input: &str, message: &'static str) -> std::result::Result<(), &'static str> {
    if split_list(input).is_empty() {
        Err(message)
    } else {
        Ok(())
    }
}

fn optional(answer: String) -> Option<String> {
    let trimmed = answer.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
