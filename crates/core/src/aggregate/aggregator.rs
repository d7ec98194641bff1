use crate::config::Settings;
use crate::domain::prediction::{PredictionRecord, PredictionResult};
use crate::domain::ticker::Ticker;
use crate::predict::client::PredictionClient;
use crate::predict::error::FetchError;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;

/// Fans one fetch per ticker out over a [`PredictionClient`] and reassembles the results in
/// input order.
#[derive(Clone)]
pub struct Aggregator {
    client: Arc<dyn PredictionClient>,
    max_in_flight: Option<usize>,
}

impl Aggregator {
    pub fn new(client: Arc<dyn PredictionClient>) -> Self {
        Self {
            client,
            max_in_flight: None,
        }
    }

    pub fn from_settings(client: Arc<dyn PredictionClient>, settings: &Settings) -> Self {
        Self::new(client).with_max_in_flight(settings.prediction_max_in_flight)
    }

    /// Caps concurrent fetches. `None` (the default) runs every ticker at once.
    pub fn with_max_in_flight(mut self, max_in_flight: Option<usize>) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn client_name(&self) -> &'static str {
        self.client.client_name()
    }

    /// Returns exactly one result per input ticker, at the same position.
    ///
    /// Every fetch runs to a terminal state before this returns. A failed fetch becomes a
    /// `Failure` entry and never affects its siblings. Completion order is not observable.
    pub async fn run_all(&self, tickers: &[Ticker]) -> Vec<PredictionResult> {
        if tickers.is_empty() {
            return Vec::new();
        }

        let started = Instant::now();
        let limit = self
            .max_in_flight
            .unwrap_or(tickers.len())
            .clamp(1, tickers.len());
        let client = self.client.as_ref();

        // None = pending.
        let mut slots: Vec<Option<PredictionResult>> = (0..tickers.len()).map(|_| None).collect();

        let fetches: Vec<_> = tickers
            .iter()
            .enumerate()
            .map(|(idx, ticker)| async move { (idx, client.fetch_prediction(ticker).await) })
            .collect();
        let mut completions = stream::iter(fetches).buffer_unordered(limit);

        while let Some((idx, res)) = completions.next().await {
            slots[idx] = Some(settle(&tickers[idx], res));
        }

        let results: Vec<PredictionResult> = slots
            .into_iter()
            .zip(tickers)
            .map(|(slot, ticker)| {
                slot.unwrap_or_else(|| PredictionResult::Failure {
                    ticker: ticker.clone(),
                    error: FetchError::network(ticker, "fetch did not reach a terminal state"),
                })
            })
            .collect();

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        tracing::info!(
            client = self.client.client_name(),
            tickers = tickers.len(),
            succeeded,
            failed = results.len() - succeeded,
            max_in_flight = limit,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "prediction run finished"
        );

        results
    }
}

/// Binds a completed fetch to the ticker at its input position.
fn settle(ticker: &Ticker, res: Result<PredictionRecord, FetchError>) -> PredictionResult {
    match res {
        Ok(record) if record.symbol == ticker.symbol => PredictionResult::Success(record),
        Ok(record) => {
            let error = FetchError::malformed(
                ticker,
                format!(
                    "client returned a record for {} while fetching {}",
                    record.symbol, ticker.symbol
                ),
            );
            tracing::warn!(
                symbol = %ticker.symbol,
                kind = %error.kind,
                cause = %error.cause,
                "prediction fetch failed"
            );
            PredictionResult::Failure {
                ticker: ticker.clone(),
                error,
            }
        }
        Err(error) => {
            tracing::warn!(
                symbol = %ticker.symbol,
                kind = %error.kind,
                cause = %error.cause,
                "prediction fetch failed"
            );
            PredictionResult::Failure {
                ticker: ticker.clone(),
                error,
            }
        }
    }
}
