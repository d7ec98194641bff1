use clap::Parser;
use featured_core::aggregate::{Aggregator, PredictionBoard, RefreshOutcome};
use featured_core::domain::ticker;
use featured_core::predict::{FixtureClient, HttpPredictionClient, PredictionClient};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

#[derive(Debug, Parser)]
#[command(name = "featured_worker")]
struct Args {
    /// Watchlist override, e.g. `AAPL=Apple,NVDA=NVIDIA`. Defaults to FEATURED_TICKERS or the
    /// built-in ten.
    #[arg(long)]
    tickers: Option<String>,

    /// Serve the built-in demo predictions instead of calling the prediction service.
    #[arg(long)]
    offline: bool,

    /// Print rows as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Cap on concurrent fetches. Defaults to PREDICTION_MAX_IN_FLIGHT or one per ticker.
    #[arg(long)]
    max_in_flight: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = featured_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(args, &settings).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "featured run failed");
        return Err(err);
    }
    Ok(())
}

async fn run(args: Args, settings: &featured_core::config::Settings) -> anyhow::Result<()> {
    let tickers = match args.tickers.as_deref() {
        Some(list) => ticker::parse_watchlist(list)?,
        None => settings.tickers()?,
    };

    let client: Arc<dyn PredictionClient> = if args.offline {
        Arc::new(FixtureClient::new())
    } else {
        Arc::new(HttpPredictionClient::from_settings(settings)?)
    };

    let max_in_flight = args.max_in_flight.or(settings.prediction_max_in_flight);
    anyhow::ensure!(max_in_flight != Some(0), "--max-in-flight must be >= 1");
    let aggregator = Aggregator::new(client).with_max_in_flight(max_in_flight);

    tracing::info!(
        tickers = tickers.len(),
        client = aggregator.client_name(),
        "fetching predictions"
    );

    let board = PredictionBoard::new();
    let batch = match board.refresh(&aggregator, &tickers).await {
        RefreshOutcome::Published(batch) => batch,
        RefreshOutcome::Superseded { generation, .. } => {
            anyhow::bail!("refresh {generation} was superseded in a single-run worker")
        }
    };

    let rows = batch.rows();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{}", render::board_table(&rows));
    }

    if batch.failed() > 0 {
        tracing::warn!(
            failed = batch.failed(),
            succeeded = batch.succeeded(),
            "some tickers are unavailable"
        );
    }
    Ok(())
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
