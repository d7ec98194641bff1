pub mod aggregator;
pub mod board;

pub use aggregator::Aggregator;
pub use board::{Batch, PredictionBoard, RefreshOutcome, RefreshTicket};
