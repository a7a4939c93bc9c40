// Compiled-in run parameters.

/// Two-letter state abbreviation. Must be capitalized.
pub const REGION: &str = "CO";
/// Used for the hashtag in the message header.
pub const REGION_NAME: &str = "Colorado";
/// Appended to every message on its own line.
pub const HASHTAGS: &str = "#Python";

pub const MAX_MESSAGE_LEN: usize = 280;
pub const LOG_FILE: &str = "covid_tweet.log";

pub const STATS_API_URL: &str = "https://api.covidactnow.org";
pub const TWITTER_API_URL: &str = "https://api.twitter.com";

/// Seconds to wait after a successful post before exiting.
pub const POST_PAUSE_SECS: u64 = 60;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
