pub mod config;
pub mod constants;
pub mod gate;
pub mod logging;
pub mod oauth;
pub mod publish;
pub mod report;
pub mod run;
pub mod stats;

pub use crate::config::{Config, ConfigError, TwitterCredentials};
pub use crate::gate::{LengthGate, Verdict};
pub use crate::publish::{PublishError, Publisher};
pub use crate::report::{DerivedMetrics, Report, ReportError, Table};
pub use crate::run::{run, Mode, Outcome, RunError};
pub use crate::stats::{CountryStats, FetchError, RegionStats, StatsClient};
