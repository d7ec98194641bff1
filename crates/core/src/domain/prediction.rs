use crate::domain::ticker::Ticker;
use crate::predict::error::FetchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scores strictly above this are positive, strictly below its negation negative.
pub const SENTIMENT_THRESHOLD: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentBucket {
    Positive,
    Neutral,
    Negative,
}

impl SentimentBucket {
    pub fn classify(score: f64) -> Self {
        if score > SENTIMENT_THRESHOLD {
            Self::Positive
        } else if score < -SENTIMENT_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        }
    }
}

impl fmt::Display for SentimentBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
}

/// Open price as reported by the service, kept as decimal text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpenPrice(String);

impl OpenPrice {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let trimmed = raw.trim();
        let value = trimmed
            .parse::<f64>()
            .map_err(|_| anyhow::anyhow!("open_price is not a decimal: {raw:?}"))?;
        anyhow::ensure!(value.is_finite(), "open_price must be finite (got {raw:?})");
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn display(&self) -> String {
        format!("${}", self.0)
    }
}

/// Signed percentage change with the string shown to users.
///
/// The service may send either `"-0.04%"` or `-0.04`. A string is kept verbatim for display and
/// parsed for the numeric value; a number gets a derived two-decimal display string. Both paths
/// agree on the sign, so [`ProjectedChange::direction`] never depends on which one was used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedChange {
    pub value: f64,
    pub display: String,
}

impl ProjectedChange {
    pub fn from_number(value: f64) -> anyhow::Result<Self> {
        anyhow::ensure!(
            value.is_finite(),
            "predicted_change must be finite (got {value})"
        );
        Ok(Self {
            value,
            display: format!("{value:.2}%"),
        })
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let display = raw.trim();
        let numeric = display.strip_suffix('%').unwrap_or(display).trim_end();
        let value = numeric
            .parse::<f64>()
            .map_err(|_| anyhow::anyhow!("predicted_change is not a percentage: {raw:?}"))?;
        anyhow::ensure!(
            value.is_finite(),
            "predicted_change must be finite (got {raw:?})"
        );
        Ok(Self {
            value,
            display: display.to_string(),
        })
    }

    pub fn direction(&self) -> Direction {
        if self.value.is_sign_negative() || self.display.starts_with('-') {
            Direction::Decrease
        } else {
            Direction::Increase
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub symbol: String,
    pub company_name: String,
    pub open_price: OpenPrice,
    pub sentiment_score: f64,
    pub projected_change: ProjectedChange,
}

impl PredictionRecord {
    /// Recomputed on every call so threshold changes apply to already-fetched records.
    pub fn sentiment(&self) -> SentimentBucket {
        SentimentBucket::classify(self.sentiment_score)
    }

    pub fn direction(&self) -> Direction {
        self.projected_change.direction()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionResult {
    Success(PredictionRecord),
    Failure { ticker: Ticker, error: FetchError },
}

impl PredictionResult {
    pub fn symbol(&self) -> &str {
        match self {
            Self::Success(record) => &record.symbol,
            Self::Failure { ticker, .. } => &ticker.symbol,
        }
    }

    pub fn company_name(&self) -> &str {
        match self {
            Self::Success(record) => &record.company_name,
            Self::Failure { ticker, .. } => &ticker.company_name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn record(&self) -> Option<&PredictionRecord> {
        match self {
            Self::Success(record) => Some(record),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Success(_) => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

impl From<Result<PredictionRecord, FetchError>> for PredictionResult {
    fn from(res: Result<PredictionRecord, FetchError>) -> Self {
        match res {
            Ok(record) => Self::Success(record),
            Err(error) => Self::Failure {
                ticker: error.ticker.clone(),
                error,
            },
        }
    }
}
