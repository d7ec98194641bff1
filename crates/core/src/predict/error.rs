use crate::domain::ticker::Ticker;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection failure or timeout before a response arrived.
    Network,
    /// The service answered with a non-2xx status.
    BadStatus(u16),
    /// Body was not JSON, or a required field was missing or mistyped.
    MalformedPayload,
}

impl FetchErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::BadStatus(_) => "bad_status",
            Self::MalformedPayload => "malformed_payload",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An expected, per-ticker fetch outcome. Never escalated past the aggregator.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{ticker} ({kind}): {cause}")]
pub struct FetchError {
    pub ticker: Ticker,
    pub kind: FetchErrorKind,
    pub cause: String,
}

impl FetchError {
    pub fn new(ticker: Ticker, kind: FetchErrorKind, cause: impl Into<String>) -> Self {
        Self {
            ticker,
            kind,
            cause: cause.into(),
        }
    }

    pub fn network(ticker: &Ticker, cause: impl Into<String>) -> Self {
        Self::new(ticker.clone(), FetchErrorKind::Network, cause)
    }

    pub fn bad_status(ticker: &Ticker, status: u16, cause: impl Into<String>) -> Self {
        Self::new(ticker.clone(), FetchErrorKind::BadStatus(status), cause)
    }

    pub fn malformed(ticker: &Ticker, cause: impl Into<String>) -> Self {
        Self::new(ticker.clone(), FetchErrorKind::MalformedPayload, cause)
    }
}
