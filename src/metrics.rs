use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const RECOMPUTE_TOTAL: &str = "stats_recompute_total";
pub const RECOMPUTE_MS: &str = "stats_recompute_ms";
pub const STALE_DISCARDED_TOTAL: &str = "stats_stale_discarded_total";
pub const SOURCE_ERRORS_TOTAL: &str = "stats_source_errors_total";
pub const INVALID_WINDOW_TOTAL: &str = "stats_invalid_window_total";
pub const LAST_RECORD_COUNT: &str = "stats_last_record_count";

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(RECOMPUTE_TOTAL, "Snapshots computed from a record set.");
        describe_histogram!(RECOMPUTE_MS, "Snapshot computation time in milliseconds.");
        describe_counter!(
            STALE_DISCARDED_TOTAL,
            "Results dropped because their window was superseded."
        );
        describe_counter!(SOURCE_ERRORS_TOTAL, "Record source failures surfaced.");
        describe_counter!(INVALID_WINDOW_TOTAL, "Custom windows rejected at selection.");
        describe_gauge!(LAST_RECORD_COUNT, "Record count of the last computed snapshot.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        ensure_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
