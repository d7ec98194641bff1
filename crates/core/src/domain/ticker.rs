use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The watchlist shown on the featured board when nothing else is configured.
pub const DEFAULT_WATCHLIST: [(&str, &str); 10] = [
    ("AAPL", "Apple"),
    ("NVDA", "NVIDIA"),
    ("MSFT", "Microsoft"),
    ("AMZN", "Amazon"),
    ("META", "Meta"),
    ("GOOGL", "Alphabet"),
    ("TSLA", "Tesla"),
    ("ORCL", "Oracle"),
    ("AMD", "AMD"),
    ("NFLX", "Netflix"),
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub company_name: String,
}

impl Ticker {
    pub fn try_new(symbol: &str, company_name: &str) -> anyhow::Result<Self> {
        let symbol = symbol.trim().to_ascii_uppercase();
        ensure!(!symbol.is_empty(), "ticker symbol must be non-empty");

        let company_name = company_name.trim().to_string();
        ensure!(
            !company_name.is_empty(),
            "company name must be non-empty (symbol={symbol})"
        );

        Ok(Self {
            symbol,
            company_name,
        })
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

pub fn default_watchlist() -> Vec<Ticker> {
    DEFAULT_WATCHLIST
        .iter()
        .map(|(symbol, company_name)| Ticker {
            symbol: (*symbol).to_string(),
            company_name: (*company_name).to_string(),
        })
        .collect()
}

/// Parses `AAPL=Apple,NVDA=NVIDIA`. Order is preserved and duplicates are kept.
pub fn parse_watchlist(list: &str) -> anyhow::Result<Vec<Ticker>> {
    let mut out = Vec::new();
    for entry in list.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let Some((symbol, company_name)) = entry.split_once('=') else {
            anyhow::bail!("watchlist entry must look like SYMBOL=Company (got {entry:?})");
        };
        out.push(Ticker::try_new(symbol, company_name)?);
    }
    Ok(out)
}
