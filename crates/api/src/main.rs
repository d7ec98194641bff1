use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use featured_core::aggregate::{Aggregator, Batch, PredictionBoard, RefreshOutcome};
use featured_core::domain::row::PredictionRow;
use featured_core::domain::ticker::Ticker;
use featured_core::predict::HttpPredictionClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = featured_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let tickers = settings.tickers().inspect_err(report)?;
    let client = HttpPredictionClient::from_settings(&settings).inspect_err(report)?;
    let aggregator = Aggregator::from_settings(Arc::new(client), &settings);

    let state = AppState {
        board: Arc::new(PredictionBoard::new()),
        aggregator,
        tickers: Arc::new(tickers),
    };

    if settings.refresh_on_start {
        let state = state.clone();
        tokio::spawn(async move {
            let outcome = state.board.refresh(&state.aggregator, &state.tickers).await;
            if let RefreshOutcome::Published(batch) = outcome {
                tracing::info!(
                    generation = batch.generation,
                    succeeded = batch.succeeded(),
                    failed = batch.failed(),
                    "startup refresh published"
                );
            }
        });
    }

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/predictions/latest", get(get_latest_batch))
        .route("/predictions/latest/:symbol", get(get_latest_rows_by_symbol))
        .route("/predictions/refresh", post(refresh_predictions))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));

    tracing::info!(%addr, service = %settings.prediction_service_url, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    board: Arc<PredictionBoard>,
    aggregator: Aggregator,
    tickers: Arc<Vec<Ticker>>,
}

#[derive(Debug, Serialize)]
struct ApiBatch {
    generation: u64,
    fetched_at: DateTime<Utc>,
    succeeded: usize,
    failed: usize,
    rows: Vec<PredictionRow>,
}

impl From<&Batch> for ApiBatch {
    fn from(batch: &Batch) -> Self {
        Self {
            generation: batch.generation,
            fetched_at: batch.fetched_at,
            succeeded: batch.succeeded(),
            failed: batch.failed(),
            rows: batch.rows(),
        }
    }
}

async fn get_latest_batch(State(state): State<AppState>) -> Result<Json<ApiBatch>, StatusCode> {
    let batch = state.board.latest().await.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(ApiBatch::from(batch.as_ref())))
}

async fn get_latest_rows_by_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Vec<PredictionRow>>, StatusCode> {
    let batch = state.board.latest().await.ok_or(StatusCode::NOT_FOUND)?;

    let symbol = symbol.trim().to_ascii_uppercase();
    let rows: Vec<PredictionRow> = batch
        .rows()
        .into_iter()
        .filter(|row| row.symbol == symbol)
        .collect();

    if rows.is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(rows))
}

async fn refresh_predictions(
    State(state): State<AppState>,
) -> Result<Json<ApiBatch>, StatusCode> {
    match state.board.refresh(&state.aggregator, &state.tickers).await {
        RefreshOutcome::Published(batch) => {
            tracing::info!(
                generation = batch.generation,
                succeeded = batch.succeeded(),
                failed = batch.failed(),
                "refresh published"
            );
            Ok(Json(ApiBatch::from(batch.as_ref())))
        }
        RefreshOutcome::Superseded {
            generation,
            latest_issued,
        } => {
            tracing::info!(generation, latest_issued, "refresh superseded by a newer one");
            Err(StatusCode::CONFLICT)
        }
    }
}

fn report(err: &anyhow::Error) {
    sentry_anyhow::capture_anyhow(err);
    tracing::error!(error = %err, "api startup failed");
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &featured_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
