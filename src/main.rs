use anyhow::Context;
use clap::Parser;
use covid_tweet::constants::LOG_FILE;
use covid_tweet::{logging, run, Config, Mode, Outcome};
use std::fmt::Display;
use std::path::Path;
use std::process;
use tracing::error;

/// Post the latest COVID-19 numbers for the configured state.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Print the message instead of posting it
    #[arg(long)]
    dry_run: bool,
}

fn logged<T, E: Display>(res: Result<T, E>) -> Result<T, E> {
    if let Err(e) = &res {
        error!("{}", e);
    }
    res
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. parse args, open the log and read credentials
    let cli = Cli::parse();
    logging::init(Path::new(LOG_FILE))
        .with_context(|| format!("opening log file {}", LOG_FILE))?;

    let config = logged(Config::from_env())?;
    let mode = if cli.dry_run { Mode::DryRun } else { Mode::Publish };
    if mode == Mode::Publish {
        logged(config.twitter())?;
    }

    // 2. fetch, format, check and post
    match logged(run(&config, mode).await)? {
        Outcome::Sent { .. }
        | Outcome::Previewed { .. }
        | Outcome::TooLong { .. }
        | Outcome::PublishFailed(_) => process::exit(0),
    }
}
