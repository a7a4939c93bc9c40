use std::time::Duration;

use reqwest::{header::AUTHORIZATION, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError, TwitterCredentials};
use crate::oauth::{self, Nonce};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Credentials(#[from] ConfigError),
    #[error("failed to sign request: {0}")]
    Signing(#[from] hmac::digest::InvalidLength),
    #[error("request to posting provider failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("posting provider rejected the post ({status}): {detail}")]
    Rejected { status: StatusCode, detail: String },
}

#[derive(Serialize)]
struct NewPost<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Posted {
    pub id: String,
    pub text: String,
}

#[derive(Deserialize)]
struct PostedEnvelope {
    data: Posted,
}

#[derive(Deserialize, Default)]
struct ProblemBody {
    title: Option<String>,
    detail: Option<String>,
}

#[derive(Debug)]
pub struct Publisher {
    client: reqwest::Client,
    url: String,
    creds: TwitterCredentials,
    pause: Duration,
}

impl Publisher {
    pub fn new(config: &Config) -> Result<Self, PublishError> {
        let creds = config.twitter()?.clone();
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Publisher {
            client,
            url: format!("{}/2/tweets", config.twitter_api_url.trim_end_matches('/')),
            creds,
            pause: config.post_pause,
        })
    }

    /// Sends `text` as a new post. The caller checks its length first.
    ///
    /// Any 2xx means the post is live. The returned details are `None` when
    /// the provider's response body can't be read or decoded.
    pub async fn post(&self, text: &str) -> Result<Option<Posted>, PublishError> {
        let nonce = Nonce::generate();
        let auth = oauth::authorization_header("POST", &self.url, &[], &self.creds, &nonce)?;
        debug!(url = %self.url, chars = text.chars().count(), "posting");

        let res = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, auth)
            .json(&NewPost { text })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let problem: ProblemBody = serde_json::from_str(&body).unwrap_or_default();
            let detail = problem.detail.or(problem.title).unwrap_or(body);
            return Err(PublishError::Rejected { status, detail });
        }

        let decoded = match res.text().await {
            Ok(body) => serde_json::from_str::<PostedEnvelope>(&body).map_err(|e| e.to_string()),
            Err(e) => Err(e.without_url().to_string()),
        };
        match decoded {
            Ok(envelope) => {
                info!(id = %envelope.data.id, "Posted to Twitter.");
                Ok(Some(envelope.data))
            }
            Err(error) => {
                warn!(%status, %error, "Posted to Twitter, response body not understood.");
                Ok(None)
            }
        }
    }

    /// Holds the process after a post so a scheduler re-run can't double-post.
    pub async fn pause(&self) {
        if !self.pause.is_zero() {
            info!("Waiting {}s before exit.", self.pause.as_secs());
            tokio::time::sleep(self.pause).await;
        }
    }
}
