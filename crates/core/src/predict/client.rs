use crate::config::Settings;
use crate::domain::prediction::PredictionRecord;
use crate::domain::ticker::Ticker;
use crate::predict::error::FetchError;
use crate::predict::wire;
use anyhow::Context;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_PATH: &str = "/get_stock_prediction";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Error bodies can be whole HTML pages; keep only the head in the failure cause.
const MAX_BODY_IN_CAUSE: usize = 200;

#[async_trait::async_trait]
pub trait PredictionClient: Send + Sync {
    fn client_name(&self) -> &'static str;

    /// Exactly one outbound call. No retries at this layer.
    async fn fetch_prediction(&self, ticker: &Ticker) -> Result<PredictionRecord, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    http: reqwest::Client,
    base_url: String,
    path: String,
}

impl HttpPredictionClient {
    pub fn new(base_url: &str, path: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build prediction service http client")?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            path: path.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(
            &settings.prediction_service_url,
            &settings.prediction_path,
            Duration::from_secs(settings.prediction_timeout_secs),
        )
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait::async_trait]
impl PredictionClient for HttpPredictionClient {
    fn client_name(&self) -> &'static str {
        "http"
    }

    async fn fetch_prediction(&self, ticker: &Ticker) -> Result<PredictionRecord, FetchError> {
        let res = self
            .http
            .get(self.url())
            .query(&[
                ("company_name", ticker.company_name.as_str()),
                ("symbol", ticker.symbol.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::network(ticker, format!("prediction request failed: {e}")))?;

        let status = res.status();
        let text = res.text().await.map_err(|e| {
            FetchError::network(ticker, format!("failed to read prediction response: {e}"))
        })?;

        if !status.is_success() {
            return Err(FetchError::bad_status(
                ticker,
                status.as_u16(),
                format!("prediction service HTTP {status}: {}", truncate(&text)),
            ));
        }

        // Reason first, so truncating a long body never hides which field was wrong.
        wire::parse_reply(&text, ticker).map_err(|e| {
            FetchError::malformed(ticker, format!("{e:#}; body: {}", truncate(&text)))
        })
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= MAX_BODY_IN_CAUSE {
        return s.to_string();
    }
    let head: String = s.chars().take(MAX_BODY_IN_CAUSE).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::error::FetchErrorKind;
    use serde_json::json;

    fn aapl() -> Ticker {
        Ticker::try_new("AAPL", "Apple").unwrap()
    }

    fn client_for(server: &mockito::ServerGuard) -> HttpPredictionClient {
        HttpPredictionClient::new(&server.url(), DEFAULT_PATH, Duration::from_secs(5)).unwrap()
    }

    fn query_for(ticker: &Ticker) -> mockito::Matcher {
        mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("company_name".into(), ticker.company_name.clone()),
            mockito::Matcher::UrlEncoded("symbol".into(), ticker.symbol.clone()),
        ])
    }

    #[test]
    fn url_joins_base_and_path() {
        let c = HttpPredictionClient::new(
            "http://localhost:8000/",
            "get_stock_prediction",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(c.url(), "http://localhost:8000/get_stock_prediction");
    }

    #[tokio::test]
    async fn maps_success_reply_into_record() {
        let mut server = mockito::Server::new_async().await;
        let ticker = aapl();

        let mock = server
            .mock("GET", DEFAULT_PATH)
            .match_query(query_for(&ticker))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "open_price": "227.78",
                    "sentiment_score": 0.30,
                    "predicted_change": "-0.04%",
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let record = client_for(&server).fetch_prediction(&ticker).await.unwrap();
        assert_eq!(record.symbol, "AAPL");
        assert_eq!(record.open_price.as_str(), "227.78");
        assert_eq!(record.projected_change.display, "-0.04%");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_bad_status() {
        let mut server = mockito::Server::new_async().await;
        let ticker = aapl();

        server
            .mock("GET", DEFAULT_PATH)
            .match_query(query_for(&ticker))
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_prediction(&ticker)
            .await
            .unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::BadStatus(500));
        assert_eq!(err.ticker, ticker);
        assert!(err.cause.contains("internal error"));
    }

    #[tokio::test]
    async fn missing_field_is_malformed_payload() {
        let mut server = mockito::Server::new_async().await;
        let ticker = aapl();

        server
            .mock("GET", DEFAULT_PATH)
            .match_query(query_for(&ticker))
            .with_status(200)
            .with_body(json!({"open_price": "227.78", "sentiment_score": 0.3}).to_string())
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_prediction(&ticker)
            .await
            .unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::MalformedPayload);
    }

    #[tokio::test]
    async fn long_malformed_body_still_names_missing_field() {
        let mut server = mockito::Server::new_async().await;
        let ticker = aapl();

        let body = json!({
            "note": "x".repeat(MAX_BODY_IN_CAUSE + 50),
            "open_price": "227.78",
            "sentiment_score": 0.3,
        })
        .to_string();
        assert!(body.chars().count() > MAX_BODY_IN_CAUSE);

        server
            .mock("GET", DEFAULT_PATH)
            .match_query(query_for(&ticker))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_prediction(&ticker)
            .await
            .unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::MalformedPayload);
        assert!(err.cause.contains("predicted_change"), "cause: {}", err.cause);
        assert!(err.cause.ends_with("..."));
    }

    #[tokio::test]
    async fn slow_service_times_out_as_network_error() {
        // Bound but never accepted: the request is queued and no reply ever comes back.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let client =
            HttpPredictionClient::new(&base, DEFAULT_PATH, Duration::from_millis(200)).unwrap();

        let err = client.fetch_prediction(&aapl()).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Network);
        assert!(err.cause.contains("prediction request failed"));
        drop(listener);
    }

    #[tokio::test]
    async fn unreachable_service_is_network_error() {
        // Nothing listens on port 9 in the test environment.
        let client =
            HttpPredictionClient::new("http://127.0.0.1:9", DEFAULT_PATH, Duration::from_secs(2))
                .unwrap();

        let err = client.fetch_prediction(&aapl()).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Network);
    }

    #[test]
    fn truncate_keeps_short_bodies() {
        assert_eq!(truncate("short"), "short");
        let long = "x".repeat(MAX_BODY_IN_CAUSE + 10);
        assert!(truncate(&long).ends_with("..."));
    }
}
