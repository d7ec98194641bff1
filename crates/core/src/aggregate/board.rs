use crate::aggregate::aggregator::Aggregator;
use crate::domain::prediction::PredictionResult;
use crate::domain::row::{self, PredictionRow};
use crate::domain::ticker::Ticker;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// One accepted aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub generation: u64,
    pub fetched_at: DateTime<Utc>,
    pub results: Vec<PredictionResult>,
}

impl Batch {
    pub fn rows(&self) -> Vec<PredictionRow> {
        row::rows(&self.results)
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Published(Arc<Batch>),
    /// A newer refresh was started while this one ran; its results were dropped.
    Superseded { generation: u64, latest_issued: u64 },
}

/// Holds the latest accepted batch. Every refresh takes a ticket; only the batch of the most
/// recently issued ticket is published, so a slow refresh can never overwrite a newer one.
#[derive(Debug, Default)]
pub struct PredictionBoard {
    issued: AtomicU64,
    latest: RwLock<Option<Arc<Batch>>>,
}

impl PredictionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_refresh(&self) -> RefreshTicket {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        RefreshTicket { generation }
    }

    pub fn latest_issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    pub async fn latest(&self) -> Option<Arc<Batch>> {
        self.latest.read().await.clone()
    }

    pub async fn publish(
        &self,
        ticket: RefreshTicket,
        results: Vec<PredictionResult>,
    ) -> RefreshOutcome {
        let mut latest = self.latest.write().await;

        let latest_issued = self.latest_issued();
        let already_newer = latest
            .as_ref()
            .is_some_and(|batch| batch.generation >= ticket.generation);
        if ticket.generation != latest_issued || already_newer {
            tracing::debug!(
                generation = ticket.generation,
                latest_issued,
                "discarding superseded prediction batch"
            );
            return RefreshOutcome::Superseded {
                generation: ticket.generation,
                latest_issued,
            };
        }

        let batch = Arc::new(Batch {
            generation: ticket.generation,
            fetched_at: Utc::now(),
            results,
        });
        *latest = Some(batch.clone());
        RefreshOutcome::Published(batch)
    }

    pub async fn refresh(&self, aggregator: &Aggregator, tickers: &[Ticker]) -> RefreshOutcome {
        let ticket = self.begin_refresh();
        tracing::info!(generation = ticket.generation, tickers = tickers.len(), "refresh started");
        let results = aggregator.run_all(tickers).await;
        self.publish(ticket, results).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ticker::default_watchlist;
    use crate::predict::fixture::FixtureClient;

    #[tokio::test]
    async fn empty_board_has_no_batch() {
        let board = PredictionBoard::new();
        assert!(board.latest().await.is_none());
        assert_eq!(board.latest_issued(), 0);
    }

    #[tokio::test]
    async fn publishes_current_refresh() {
        let board = PredictionBoard::new();
        let agg = Aggregator::new(Arc::new(FixtureClient::new()));

        let outcome = board.refresh(&agg, &default_watchlist()).await;
        let RefreshOutcome::Published(batch) = outcome else {
            panic!("expected the only refresh to be published");
        };
        assert_eq!(batch.generation, 1);
        assert_eq!(batch.results.len(), 10);
        assert_eq!(batch.succeeded(), 10);
        assert_eq!(board.latest().await.unwrap().generation, 1);
    }

    #[tokio::test]
    async fn stale_refresh_is_discarded() {
        let board = PredictionBoard::new();
        let stale = board.begin_refresh();
        let fresh = board.begin_refresh();

        let outcome = board.publish(fresh, Vec::new()).await;
        assert!(matches!(outcome, RefreshOutcome::Published(_)));

        let outcome = board.publish(stale, Vec::new()).await;
        assert!(matches!(
            outcome,
            RefreshOutcome::Superseded {
                generation: 1,
                latest_issued: 2
            }
        ));
        assert_eq!(board.latest().await.unwrap().generation, 2);
    }

    #[tokio::test]
    async fn older_ticket_finishing_first_is_still_dropped() {
        let board = PredictionBoard::new();
        let stale = board.begin_refresh();
        let _fresh = board.begin_refresh();

        let outcome = board.publish(stale, Vec::new()).await;
        assert!(matches!(outcome, RefreshOutcome::Superseded { .. }));
        assert!(board.latest().await.is_none());
    }

    #[tokio::test]
    async fn ticket_cannot_publish_twice() {
        let board = PredictionBoard::new();
        let ticket = board.begin_refresh();
        assert!(matches!(
            board.publish(ticket, Vec::new()).await,
            RefreshOutcome::Published(_)
        ));
        assert!(matches!(
            board.publish(ticket, Vec::new()).await,
            RefreshOutcome::Superseded { .. }
        ));
    }
}
