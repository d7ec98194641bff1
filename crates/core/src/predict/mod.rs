pub mod client;
pub mod error;
pub mod fixture;
pub mod wire;

pub use client::{HttpPredictionClient, PredictionClient};
pub use error::{FetchError, FetchErrorKind};
pub use fixture::FixtureClient;
