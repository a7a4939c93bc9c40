use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::gate::{LengthGate, Verdict};
use crate::publish::{PublishError, Publisher};
use crate::report::{Report, ReportError};
use crate::stats::{FetchError, StatsClient};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Publish,
    /// Stop after the length check; nothing is posted.
    DryRun,
}

/// How a run ended. Every variant ends the process normally.
#[derive(Debug)]
pub enum Outcome {
    /// `id` is `None` when the provider accepted the post but its reply
    /// could not be decoded.
    Sent { id: Option<String>, text: String },
    Previewed { text: String },
    TooLong { length: usize },
    PublishFailed(PublishError),
}

pub async fn run(config: &Config, mode: Mode) -> Result<Outcome, RunError> {
    let client = StatsClient::new(config)?;
    let region = client.fetch_region(&config.region).await?;
    let country = client.fetch_country().await?;

    let report = Report::build(config, &region, &country)?;
    println!("{}\n", report.region_table);
    println!("{}\n", report.country_table);

    let gate = LengthGate::new(config.max_message_len);
    let text = match gate.check(&report.message, &config.hashtags) {
        Verdict::Within { text, .. } => text,
        Verdict::Exceeded { length } => {
            warn!(
                "Message exceeds {} characters. {} Tweet not sent.",
                config.max_message_len, length
            );
            return Ok(Outcome::TooLong { length });
        }
    };

    if mode == Mode::DryRun {
        println!("{}", text);
        info!("Dry run, tweet not sent.");
        return Ok(Outcome::Previewed { text });
    }

    match publish(config, &text).await {
        Ok(id) => {
            info!("Twitter message:\n{}", text);
            Ok(Outcome::Sent { id, text })
        }
        Err(e) => {
            error!("{}", e);
            Ok(Outcome::PublishFailed(e))
        }
    }
}

async fn publish(config: &Config, text: &str) -> Result<Option<String>, PublishError> {
    let publisher = Publisher::new(config)?;
    let posted = publisher.post(text).await?;
    publisher.pause().await;
    Ok(posted.map(|p| p.id))
}
