use crate::domain::prediction::{OpenPrice, PredictionRecord, ProjectedChange};
use crate::domain::ticker::Ticker;
use crate::predict::client::PredictionClient;
use crate::predict::error::FetchError;

/// symbol, open price, sentiment score, predicted change.
const DEMO_PREDICTIONS: [(&str, &str, f64, &str); 10] = [
    ("AAPL", "227.78", 0.00, "-0.04%"),
    ("NVDA", "131.91", -0.57, "-0.25%"),
    ("MSFT", "415.23", 0.44, "0.05%"),
    ("AMZN", "187.13", 0.87, "0.34%"),
    ("META", "587.57", 0.00, "-0.04%"),
    ("GOOGL", "162.11", 0.64, "-0.08%"),
    ("TSLA", "241.81", -0.34, "-0.07%"),
    ("ORCL", "177.65", 0.80, "0.34%"),
    ("AMD", "169.76", 0.42, "0.04%"),
    ("NFLX", "723.29", -0.34, "-0.07%"),
];

/// Offline client serving the built-in demo predictions for the default watchlist.
#[derive(Debug, Clone, Default)]
pub struct FixtureClient;

impl FixtureClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl PredictionClient for FixtureClient {
    fn client_name(&self) -> &'static str {
        "fixture"
    }

    async fn fetch_prediction(&self, ticker: &Ticker) -> Result<PredictionRecord, FetchError> {
        let Some((_, open_price, sentiment_score, predicted_change)) = DEMO_PREDICTIONS
            .iter()
            .find(|(symbol, ..)| *symbol == ticker.symbol)
        else {
            return Err(FetchError::network(
                ticker,
                format!("no fixture for symbol {}", ticker.symbol),
            ));
        };

        let open_price =
            OpenPrice::parse(open_price).map_err(|e| FetchError::malformed(ticker, e.to_string()))?;
        let projected_change = ProjectedChange::parse(predicted_change)
            .map_err(|e| FetchError::malformed(ticker, e.to_string()))?;

        Ok(PredictionRecord {
            symbol: ticker.symbol.clone(),
            company_name: ticker.company_name.clone(),
            open_price,
            sentiment_score: *sentiment_score,
            projected_change,
        })
    }
}
