//! Mood Statistics Service: binary entrypoint
//! Boots the Axum HTTP server over an in-memory record store, wiring the
//! statistics routes and the Prometheus `/metrics` endpoint.

use mood_stats::api::{self, AppState};
use mood_stats::config::StatsConfig;
use mood_stats::metrics::Metrics;
use mood_stats::source::InMemoryRecordSource;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs, filter from `RUST_LOG` or `stats=info,warn`.
/// No-op when the runtime already installed a subscriber.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stats=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = StatsConfig::load_default()?;
    tracing::info!(
        target: "stats",
        default_window = %cfg.default_window,
        debounce_ms = cfg.recompute_debounce_ms,
        "config loaded"
    );

    let source = match &cfg.seed_records_path {
        Some(path) => InMemoryRecordSource::load_json(path)?,
        None => InMemoryRecordSource::new(),
    };

    let metrics = Metrics::init()?;
    let router = api::router(AppState::new(source, cfg)).merge(metrics.router());

    Ok(router.into())
}
