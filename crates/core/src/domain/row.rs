use crate::domain::prediction::{Direction, PredictionResult, SentimentBucket};
use serde::Serialize;

pub const UNAVAILABLE: &str = "unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Ok,
    Unavailable,
}

/// One line of the featured board. Failed tickers keep their row and carry the error text
/// instead of price/sentiment/change values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    pub symbol: String,
    pub company_name: String,
    pub status: RowStatus,
    pub open_price: Option<String>,
    pub sentiment: Option<SentimentBucket>,
    pub sentiment_score: Option<f64>,
    pub projected_change: Option<String>,
    pub direction: Option<Direction>,
    pub error: Option<String>,
}

impl From<&PredictionResult> for PredictionRow {
    fn from(result: &PredictionResult) -> Self {
        match result {
            PredictionResult::Success(record) => Self {
                symbol: record.symbol.clone(),
                company_name: record.company_name.clone(),
                status: RowStatus::Ok,
                open_price: Some(record.open_price.display()),
                sentiment: Some(record.sentiment()),
                sentiment_score: Some(record.sentiment_score),
                projected_change: Some(record.projected_change.display.clone()),
                direction: Some(record.direction()),
                error: None,
            },
            PredictionResult::Failure { ticker, error } => Self {
                symbol: ticker.symbol.clone(),
                company_name: ticker.company_name.clone(),
                status: RowStatus::Unavailable,
                open_price: None,
                sentiment: None,
                sentiment_score: None,
                projected_change: None,
                direction: None,
                error: Some(error.to_string()),
            },
        }
    }
}

pub fn rows(results: &[PredictionResult]) -> Vec<PredictionRow> {
    results.iter().map(PredictionRow::from).collect()
}
