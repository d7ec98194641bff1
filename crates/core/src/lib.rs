pub mod aggregate;
pub mod domain;
pub mod predict;

pub mod config {
    use crate::domain::ticker::{self, Ticker};
    use crate::predict::client::{DEFAULT_BASE_URL, DEFAULT_PATH, DEFAULT_TIMEOUT_SECS};
    use anyhow::Context;
    use std::str::FromStr;

    pub const DEFAULT_PORT: u16 = 3000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub prediction_service_url: String,
        pub prediction_path: String,
        pub prediction_timeout_secs: u64,
        pub prediction_max_in_flight: Option<usize>,
        pub featured_tickers: Option<String>,
        pub sentry_dsn: Option<String>,
        pub port: u16,
        pub refresh_on_start: bool,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                prediction_service_url: DEFAULT_BASE_URL.to_string(),
                prediction_path: DEFAULT_PATH.to_string(),
                prediction_timeout_secs: DEFAULT_TIMEOUT_SECS,
                prediction_max_in_flight: None,
                featured_tickers: None,
                sentry_dsn: None,
                port: DEFAULT_PORT,
                refresh_on_start: false,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Self::default();

            let prediction_timeout_secs = match non_empty_var("PREDICTION_TIMEOUT_SECS") {
                Some(s) => parse_at_least_one("PREDICTION_TIMEOUT_SECS", &s)?,
                None => defaults.prediction_timeout_secs,
            };

            let prediction_max_in_flight = non_empty_var("PREDICTION_MAX_IN_FLIGHT")
                .map(|s| parse_at_least_one("PREDICTION_MAX_IN_FLIGHT", &s))
                .transpose()?;

            let port = match non_empty_var("PORT") {
                Some(s) => s
                    .parse::<u16>()
                    .with_context(|| format!("PORT is not a port number: {s}"))?,
                None => defaults.port,
            };

            Ok(Self {
                prediction_service_url: non_empty_var("PREDICTION_SERVICE_URL")
                    .unwrap_or(defaults.prediction_service_url),
                prediction_path: non_empty_var("PREDICTION_PATH")
                    .unwrap_or(defaults.prediction_path),
                prediction_timeout_secs,
                prediction_max_in_flight,
                featured_tickers: non_empty_var("FEATURED_TICKERS"),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                port,
                refresh_on_start: non_empty_var("REFRESH_ON_START")
                    .is_some_and(|v| parse_flag(&v)),
            })
        }

        /// The configured watchlist, or the ten default tickers.
        pub fn tickers(&self) -> anyhow::Result<Vec<Ticker>> {
            match self.featured_tickers.as_deref() {
                Some(list) => ticker::parse_watchlist(list).context("invalid FEATURED_TICKERS"),
                None => Ok(ticker::default_watchlist()),
            }
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

    fn parse_at_least_one<T>(key: &str, raw: &str) -> anyhow::Result<T>
    where
        T: FromStr + PartialOrd + From<u8>,
    {
        let n = raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{key} is not a number: {raw}"))?;
        anyhow::ensure!(n >= T::from(1), "{key} must be >= 1 (got {raw})");
        Ok(n)
    }

    fn parse_flag(raw: &str) -> bool {
        matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    }

}
