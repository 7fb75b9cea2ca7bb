//! # Statistics Controller
//! Keeps one up-to-date `StatsState` for the consumer by re-running the
//! engine whenever the selected window or the underlying records change.
//!
//! Exactly one record subscription is live at a time. Selecting a new window
//! aborts the previous subscription and bumps the epoch in the same
//! `watch` write that publishes `Loading`; a result is only written if its
//! epoch is still current, so a superseded window can never overwrite the
//! newer one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};
use futures::stream::{self, BoxStream, StreamExt};
use metrics::{counter, gauge, histogram};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::StatsConfig;
use crate::engine;
use crate::error::{StatsError, WindowError};
use crate::metrics as m;
use crate::record::MoodRecord;
use crate::selector::{SelectionEvent, WindowSelector};
use crate::snapshot::StatsState;
use crate::source::RecordSource;
use crate::window::{ResolvedWindow, TimeWindow};

pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

fn local_clock() -> Clock {
    Arc::new(|| Local::now().naive_local())
}

/// Value seen by consumers: the state plus which selection it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Published {
    /// Increases on every (re)subscription.
    pub epoch: u64,
    pub window: Option<TimeWindow>,
    pub state: StatsState,
}

/// Handle to the live record subscription for one window selection.
/// Dropping it aborts the task and releases the source stream.
#[derive(Debug)]
pub struct Subscription {
    epoch: u64,
    window: TimeWindow,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct StatisticsController {
    source: Arc<dyn RecordSource>,
    selector: WindowSelector,
    debounce: Duration,
    clock: Clock,
    tx: watch::Sender<Published>,
    active: Option<Subscription>,
}

impl StatisticsController {
    pub fn new(source: Arc<dyn RecordSource>, cfg: &StatsConfig) -> Self {
        m::ensure_described();
        let (tx, _rx) = watch::channel(Published {
            epoch: 0,
            window: None,
            state: StatsState::Loading,
        });
        Self {
            source,
            selector: WindowSelector::with_bounds(cfg.default_window, cfg.date_bounds()),
            debounce: cfg.debounce(),
            clock: local_clock(),
            tx,
            active: None,
        }
    }

    /// Resolve preset windows against `clock` instead of the local wall clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<Published> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Published {
        self.tx.borrow().clone()
    }

    pub fn active(&self) -> Option<&Subscription> {
        self.active.as_ref()
    }

    /// Subscribe for the selector's initial window. Must run inside a Tokio runtime.
    pub fn start(&mut self) -> u64 {
        self.resubscribe()
    }

    /// Apply a selection. An invalid custom range is rejected here, before
    /// the current subscription is touched.
    pub fn select(&mut self, event: SelectionEvent) -> Result<u64, WindowError> {
        if let Err(e) = self.selector.apply(event) {
            counter!(m::INVALID_WINDOW_TOTAL).increment(1);
            warn!(target: "stats", error = %e, "window selection rejected");
            return Err(e);
        }
        Ok(self.resubscribe())
    }

    /// Re-resolve the current selection (presets move with the clock).
    pub fn refresh(&mut self) -> u64 {
        self.resubscribe()
    }

    /// Release the active subscription. The last published state stays visible.
    pub fn stop(&mut self) {
        if let Some(sub) = self.active.take() {
            debug!(target: "stats", epoch = sub.epoch, "subscription released");
        }
    }

    fn resubscribe(&mut self) -> u64 {
        // 1) Revoke the old subscription first
        self.stop();

        // 2) New epoch + Loading in one write
        let window = self.selector.window();
        let resolved = window.resolve_at((self.clock)());
        let mut epoch = 0;
        self.tx.send_modify(|p| {
            p.epoch += 1;
            p.window = Some(window);
            p.state = StatsState::Loading;
            epoch = p.epoch;
        });

        info!(
            target: "stats",
            epoch,
            %window,
            start = %resolved.start,
            end = %resolved.end,
            "statistics subscription started"
        );

        // 3) Spawn the subscription loop
        let task = tokio::spawn(run_subscription(
            self.source.clone(),
            resolved,
            epoch,
            self.tx.clone(),
            self.debounce,
        ));
        self.active = Some(Subscription {
            epoch,
            window,
            task,
        });
        epoch
    }
}

impl Drop for StatisticsController {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_subscription(
    source: Arc<dyn RecordSource>,
    resolved: ResolvedWindow,
    epoch: u64,
    tx: watch::Sender<Published>,
    debounce: Duration,
) {
    let mut records = source.observe(resolved);
    let mut ended = false;
    let mut emitted = false;

    while !ended {
        let Some(mut item) = records.next().await else {
            // a source that closes without a first set must not leave Loading behind
            if !emitted {
                warn!(
                    target: "stats",
                    source = source.name(),
                    epoch,
                    "record stream closed before first emission"
                );
                counter!(m::SOURCE_ERRORS_TOTAL).increment(1);
                let failed = StatsState::Failed {
                    message: "record stream closed before first emission".to_string(),
                };
                publish(&tx, epoch, failed);
            }
            break;
        };
        emitted = true;

        // coalesce bursts: the newest set inside the quiet period wins
        if !debounce.is_zero() {
            loop {
                match tokio::time::timeout(debounce, records.next()).await {
                    Ok(Some(newer)) => item = newer,
                    Ok(None) => {
                        ended = true;
                        break;
                    }
                    Err(_) => break,
                }
            }
        }

        let state = to_state(item, resolved, source.name());
        if !publish(&tx, epoch, state) {
            counter!(m::STALE_DISCARDED_TOTAL).increment(1);
            debug!(target: "stats", epoch, "stale result discarded");
            break;
        }
    }
}

/// Write `state` only if `epoch` is still the current one.
fn publish(tx: &watch::Sender<Published>, epoch: u64, state: StatsState) -> bool {
    tx.send_if_modified(|p| {
        if p.epoch != epoch {
            return false;
        }
        p.state = state;
        true
    })
}

fn to_state(
    item: Result<Vec<MoodRecord>, StatsError>,
    resolved: ResolvedWindow,
    source_name: &str,
) -> StatsState {
    let records = match item {
        Ok(r) => r,
        Err(e) => {
            counter!(m::SOURCE_ERRORS_TOTAL).increment(1);
            warn!(target: "stats", source = source_name, error = %e, "record source failed");
            return StatsState::Failed {
                message: e.to_string(),
            };
        }
    };

    let t0 = Instant::now();
    match engine::compute(&records) {
        Ok(snapshot) => {
            let ms = t0.elapsed().as_secs_f64() * 1000.0;
            counter!(m::RECOMPUTE_TOTAL).increment(1);
            histogram!(m::RECOMPUTE_MS).record(ms);
            gauge!(m::LAST_RECORD_COUNT).set(snapshot.total_records as f64);
            debug!(
                target: "stats",
                records = snapshot.total_records,
                days = snapshot.active_days,
                elapsed_ms = ms,
                "snapshot computed"
            );
            StatsState::Ready {
                window: resolved,
                snapshot,
            }
        }
        Err(e) => {
            warn!(target: "stats", error = %e, "snapshot computation failed");
            StatsState::Failed {
                message: e.to_string(),
            }
        }
    }
}

/// Live states for one fixed window: `Loading` first, then one state per
/// source emission. Dropping the stream cancels the source subscription.
pub fn observe_statistics(
    source: Arc<dyn RecordSource>,
    window: TimeWindow,
    now: NaiveDateTime,
) -> BoxStream<'static, StatsState> {
    m::ensure_described();
    let resolved = window.resolve_at(now);
    let name = source.name();
    let updates = source
        .observe(resolved)
        .map(move |item| to_state(item, resolved, name));
    stream::once(async { StatsState::Loading })
        .chain(updates)
        .boxed()
}

/// One-off computation for a window, used by request/response callers.
pub async fn compute_once(
    source: &dyn RecordSource,
    window: TimeWindow,
    now: NaiveDateTime,
) -> StatsState {
    let resolved = window.resolve_at(now);
    let item = source.fetch(resolved).await;
    to_state(item, resolved, source.name())
}
