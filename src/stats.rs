use std::fmt;

use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::{self, de::DeserializeOwned, Deserialize, Deserializer};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },
    #[error("malformed JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

fn string_to_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(serde::de::Error::custom)
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HospitalBeds {
    pub current_usage_covid: i64,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegionActuals {
    pub cases: i64,
    pub new_cases: i64,
    pub deaths: i64,
    pub new_deaths: i64,
    pub vaccinations_initiated: i64,
    pub vaccinations_completed: i64,
    pub hospital_beds: HospitalBeds,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegionMetrics {
    pub test_positivity_ratio: Option<f64>,
    pub weekly_new_cases_per100k: Option<f64>,
}

/// Per-state record from `/v2/state/{REGION}.json`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegionStats {
    #[serde(rename = "state")]
    pub region: String,
    pub population: Option<i64>,
    pub actuals: RegionActuals,
    pub metrics: RegionMetrics,
    #[serde(deserialize_with = "string_to_date")]
    pub last_updated_date: NaiveDate,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountryActuals {
    pub cases: i64,
    pub new_cases: i64,
    pub deaths: i64,
    pub new_deaths: i64,
}

/// Country-wide record from `/v2/country/US.json`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CountryStats {
    pub actuals: CountryActuals,
}

pub struct StatsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for StatsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl StatsClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| FetchError::Transport {
                url: config.stats_api_url.clone(),
                source,
            })?;
        Ok(StatsClient {
            client,
            base_url: config.stats_api_url.trim_end_matches('/').to_string(),
            api_key: config.stats_api_key.clone(),
        })
    }

    pub async fn fetch_region(&self, region: &str) -> Result<RegionStats, FetchError> {
        let stats: RegionStats = self.get(&format!("v2/state/{}.json", region)).await?;
        info!("Gathered {} data.", region);
        Ok(stats)
    }

    pub async fn fetch_country(&self) -> Result<CountryStats, FetchError> {
        let stats: CountryStats = self.get("v2/country/US.json").await?;
        info!("Gathered US data.");
        Ok(stats)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "fetching statistics");
        // reqwest errors carry the full URL, api key included.
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.clone(),
            source: source.without_url(),
        };

        let res = self
            .client
            .get(&url)
            .query(&[("apiKey", &self.api_key)])
            .send()
            .await
            .map_err(transport)?;

        let status = res.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status { url, status });
        }

        let body = res.text().await.map_err(transport)?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode { url, source })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use serde_json::{json, Value};

    pub(crate) fn region_json() -> Value {
        json!({
            "fips": "08",
            "country": "US",
            "state": "CO",
            "population": 1000000,
            "metrics": {
                "testPositivityRatio": 0.045,
                "weeklyNewCasesPer100k": 120,
                "caseDensity": 17.1
            },
            "actuals": {
                "cases": 900000,
                "newCases": 500,
                "deaths": 9000,
                "newDeaths": 12,
                "vaccinationsInitiated": 700000,
                "vaccinationsCompleted": 600000,
                "hospitalBeds": { "capacity": 9000, "currentUsageCovid": 300 }
            },
            "lastUpdatedDate": "2023-06-01"
        })
    }

    pub(crate) fn country_json() -> Value {
        json!({
            "country": "US",
            "actuals": {
                "cases": 90000000,
                "newCases": 40000,
                "deaths": 1000000,
                "newDeaths": 500
            }
        })
    }

    fn client_for(server: &MockServer) -> StatsClient {
        let mut config = Config::new("secret", None);
        config.stats_api_url = server.base_url();
        StatsClient::new(&config).unwrap()
    }

    #[test]
    fn decodes_region_record() {
        let stats: RegionStats = serde_json::from_value(region_json()).unwrap();
        assert_eq!(stats.region, "CO");
        assert_eq!(stats.population, Some(1000000));
        assert_eq!(stats.actuals.hospital_beds.current_usage_covid, 300);
        assert_eq!(stats.metrics.weekly_new_cases_per100k, Some(120.0));
        assert_eq!(stats.last_updated_date, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
    }

    #[test]
    fn null_metrics_decode_as_none() {
        let mut raw = region_json();
        raw["metrics"]["testPositivityRatio"] = Value::Null;
        raw["metrics"]["weeklyNewCasesPer100k"] = Value::Null;
        raw["population"] = Value::Null;
        let stats: RegionStats = serde_json::from_value(raw).unwrap();
        assert_eq!(stats.metrics.test_positivity_ratio, None);
        assert_eq!(stats.metrics.weekly_new_cases_per100k, None);
        assert_eq!(stats.population, None);
    }

    #[test]
    fn rejects_bad_date() {
        let mut raw = region_json();
        raw["lastUpdatedDate"] = json!("06/01/2023");
        assert!(serde_json::from_value::<RegionStats>(raw).is_err());
    }

    #[tokio::test]
    async fn fetches_region_with_api_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/state/CO.json")
                    .query_param("apiKey", "secret");
                then.status(200).json_body(region_json());
            })
            .await;

        let stats = client_for(&server).fetch_region("CO").await.unwrap();
        mock.assert_async().await;
        assert_eq!(stats.actuals.new_cases, 500);
    }

    #[tokio::test]
    async fn fetches_country() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/country/US.json");
                then.status(200).json_body(country_json());
            })
            .await;

        let stats = client_for(&server).fetch_country().await.unwrap();
        assert_eq!(stats.actuals.deaths, 1000000);
    }

    #[tokio::test]
    async fn non_200_is_a_status_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/state/CO.json");
                then.status(403).body("{\"error\":\"bad key\"}");
            })
            .await;

        let err = client_for(&server).fetch_region("CO").await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Status { status, .. } if status == StatusCode::FORBIDDEN
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/country/US.json");
                then.status(200).body("<html>");
            })
            .await;

        let err = client_for(&server).fetch_country().await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let mut config = Config::new("secret", None);
        config.stats_api_url = "http://127.0.0.1:1".to_string();
        let client = StatsClient::new(&config).unwrap();
        let err = client.fetch_country().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
        assert!(!format!("{} {:?}", err, err).contains("secret"));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let client = StatsClient::new(&Config::new("secret", None)).unwrap();
        let printed = format!("{:?}", client);
        assert!(!printed.contains("secret"), "{}", printed);
        assert!(printed.contains("api.covidactnow.org"));
    }
}
