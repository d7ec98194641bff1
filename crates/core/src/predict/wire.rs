use crate::domain::prediction::{OpenPrice, PredictionRecord, ProjectedChange};
use crate::domain::ticker::Ticker;
use anyhow::Context;
use serde::Deserialize;

/// Reply shape of `GET /get_stock_prediction`. Every field is required.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionReply {
    pub open_price: NumberOrText,
    pub sentiment_score: f64,
    pub predicted_change: NumberOrText,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(serde_json::Number),
    Text(String),
}

impl PredictionReply {
    /// Symbol and company name always come from the requesting ticker, never from the reply.
    pub fn into_record(self, ticker: &Ticker) -> anyhow::Result<PredictionRecord> {
        anyhow::ensure!(
            self.sentiment_score.is_finite(),
            "sentiment_score must be finite (got {})",
            self.sentiment_score
        );

        let open_price = match self.open_price {
            NumberOrText::Number(n) => OpenPrice::parse(&n.to_string()),
            NumberOrText::Text(s) => OpenPrice::parse(&s),
        }?;

        let projected_change = match self.predicted_change {
            NumberOrText::Number(n) => {
                let value = n
                    .as_f64()
                    .with_context(|| format!("predicted_change out of range: {n}"))?;
                ProjectedChange::from_number(value)
            }
            NumberOrText::Text(s) => ProjectedChange::parse(&s),
        }?;

        Ok(PredictionRecord {
            symbol: ticker.symbol.clone(),
            company_name: ticker.company_name.clone(),
            open_price,
            sentiment_score: self.sentiment_score,
            projected_change,
        })
    }
}

pub fn parse_reply(text: &str, ticker: &Ticker) -> anyhow::Result<PredictionRecord> {
    let reply = serde_json::from_str::<PredictionReply>(text)
        .context("prediction reply does not match schema")?;
    reply.into_record(ticker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::Direction;
    use serde_json::json;

    fn aapl() -> Ticker {
        Ticker::try_new("AAPL", "Apple").unwrap()
    }

    #[test]
    fn accepts_string_fields() {
        let body = json!({
            "open_price": "227.78",
            "sentiment_score": 0.30,
            "predicted_change": "-0.04%",
        })
        .to_string();

        let record = parse_reply(&body, &aapl()).unwrap();
        assert_eq!(record.symbol, "AAPL");
        assert_eq!(record.company_name, "Apple");
        assert_eq!(record.open_price.as_str(), "227.78");
        assert_eq!(record.projected_change.display, "-0.04%");
        assert_eq!(record.direction(), Direction::Decrease);
    }

    #[test]
    fn accepts_numeric_fields() {
        let body = json!({
            "open_price": 131.91,
            "sentiment_score": -0.57,
            "predicted_change": 0.34,
        })
        .to_string();

        let record = parse_reply(&body, &aapl()).unwrap();
        assert_eq!(record.open_price.as_str(), "131.91");
        assert_eq!(record.projected_change.display, "0.34%");
        assert_eq!(record.direction(), Direction::Increase);
    }

    #[test]
    fn ignores_echoed_identity_fields() {
        let body = json!({
            "symbol": "MSFT",
            "company_name": "Microsoft",
            "open_price": "1",
            "sentiment_score": 0.0,
            "predicted_change": "0%",
        })
        .to_string();

        let record = parse_reply(&body, &aapl()).unwrap();
        assert_eq!(record.symbol, "AAPL");
        assert_eq!(record.company_name, "Apple");
    }

    #[test]
    fn rejects_missing_fields() {
        for missing in ["open_price", "sentiment_score", "predicted_change"] {
            let mut v = json!({
                "open_price": "227.78",
                "sentiment_score": 0.30,
                "predicted_change": "-0.04%",
            });
            v.as_object_mut().unwrap().remove(missing);
            assert!(
                parse_reply(&v.to_string(), &aapl()).is_err(),
                "accepted reply without {missing}"
            );
        }
    }

    #[test]
    fn rejects_mistyped_fields() {
        let body = json!({
            "open_price": "227.78",
            "sentiment_score": "0.30",
            "predicted_change": "-0.04%",
        })
        .to_string();
        assert!(parse_reply(&body, &aapl()).is_err());

        let body = json!({
            "open_price": null,
            "sentiment_score": 0.30,
            "predicted_change": "-0.04%",
        })
        .to_string();
        assert!(parse_reply(&body, &aapl()).is_err());
    }

    #[test]
    fn rejects_non_json() {
        assert!(parse_reply("<html>oops</html>", &aapl()).is_err());
    }
}
