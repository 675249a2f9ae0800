//! collectonce CLI: crawl a batch of keywords once and save the results.
//!
//! Configuration comes from command-line flags, `config.json`, or an
//! interactive prompt, in that order.

mod commands;
mod prompt;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let logs = commands::init_tracing(&cli);
    commands::run(cli, logs).await
}
