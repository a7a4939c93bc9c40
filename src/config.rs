use std::fmt;
use std::time::Duration;

use config::{Environment, Map};
use serde::Deserialize;
use thiserror::Error;

use crate::constants::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] config::ConfigError),
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid config: {0}")]
    Validation(String),
}

const REDACTED: &str = "<redacted>";

/// OAuth 1.0a credentials for the posting provider.
#[derive(Clone, PartialEq, Eq)]
pub struct TwitterCredentials {
    pub app_key: String,
    pub app_secret: String,
    pub oauth_token: String,
    pub oauth_secret: String,
}

impl fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("app_key", &REDACTED)
            .field("app_secret", &REDACTED)
            .field("oauth_token", &REDACTED)
            .field("oauth_secret", &REDACTED)
            .finish()
    }
}

// Environment variable names, lowercased by the `config` crate.
#[derive(Default, Deserialize)]
struct EnvSettings {
    can_api_key: Option<String>,
    twitter_api_key: Option<String>,
    twitter_api_secret: Option<String>,
    twitter_oauth_token: Option<String>,
    twitter_oauth_secret: Option<String>,
}

/// Everything a run needs, built once at process start.
#[derive(Clone)]
pub struct Config {
    pub region: String,
    pub region_name: String,
    pub hashtags: String,
    pub max_message_len: usize,
    pub stats_api_url: String,
    pub twitter_api_url: String,
    pub post_pause: Duration,
    pub request_timeout: Duration,
    pub stats_api_key: String,
    twitter: Option<TwitterCredentials>,
}

impl Config {
    pub fn new(stats_api_key: &str, twitter: Option<TwitterCredentials>) -> Self {
        Config {
            region: REGION.to_string(),
            region_name: REGION_NAME.to_string(),
            hashtags: HASHTAGS.to_string(),
            max_message_len: MAX_MESSAGE_LEN,
            stats_api_url: STATS_API_URL.to_string(),
            twitter_api_url: TWITTER_API_URL.to_string(),
            post_pause: Duration::from_secs(POST_PAUSE_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            stats_api_key: stats_api_key.to_string(),
            twitter,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::default())
    }

    /// Same as [`Config::from_env`] but reads variables from `vars`
    /// instead of the process environment.
    pub fn from_vars(vars: Map<String, String>) -> Result<Self, ConfigError> {
        Self::load(Environment::default().source(Some(vars)))
    }

    fn load(env: Environment) -> Result<Self, ConfigError> {
        let settings: EnvSettings = config::Config::builder()
            .add_source(env)
            .build()?
            .try_deserialize()?;

        let stats_api_key =
            non_empty(settings.can_api_key).ok_or(ConfigError::Missing("CAN_API_KEY"))?;

        let twitter = match (
            non_empty(settings.twitter_api_key),
            non_empty(settings.twitter_api_secret),
            non_empty(settings.twitter_oauth_token),
            non_empty(settings.twitter_oauth_secret),
        ) {
            (Some(app_key), Some(app_secret), Some(oauth_token), Some(oauth_secret)) => {
                Some(TwitterCredentials {
                    app_key,
                    app_secret,
                    oauth_token,
                    oauth_secret,
                })
            }
            _ => None,
        };

        let config = Config::new(&stats_api_key, twitter);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.len() != 2 || !self.region.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::Validation(format!(
                "region must be a two-letter upper-case code, got {:?}",
                self.region
            )));
        }
        if self.max_message_len == 0 {
            return Err(ConfigError::Validation(
                "max_message_len must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Posting credentials; only required when a message is actually sent.
    pub fn twitter(&self) -> Result<&TwitterCredentials, ConfigError> {
        self.twitter.as_ref().ok_or(ConfigError::Missing(
            "TWITTER_API_KEY, TWITTER_API_SECRET, TWITTER_OAUTH_TOKEN or TWITTER_OAUTH_SECRET",
        ))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("region", &self.region)
            .field("region_name", &self.region_name)
            .field("hashtags", &self.hashtags)
            .field("max_message_len", &self.max_message_len)
            .field("stats_api_url", &self.stats_api_url)
            .field("twitter_api_url", &self.twitter_api_url)
            .field("post_pause", &self.post_pause)
            .field("request_timeout", &self.request_timeout)
            .field("stats_api_key", &REDACTED)
            .field("twitter", &self.twitter)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
