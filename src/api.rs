use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use tower_http::cors::CorsLayer;

use crate::config::StatsConfig;
use crate::controller::{self, Clock, Published, StatisticsController};
use crate::record::{builtin_by_label, builtin_categories, EmotionCategory, MoodRecord};
use crate::selector::{SelectionEvent, WindowSelector};
use crate::snapshot::StatsState;
use crate::source::{InMemoryRecordSource, RecordSource};
use crate::window::Preset;

#[derive(Clone)]
pub struct AppState {
    source: InMemoryRecordSource,
    config: Arc<StatsConfig>,
    clock: Clock,
    /// Live view for the consumer; started on first use.
    live: Arc<Mutex<StatisticsController>>,
}

impl AppState {
    pub fn new(source: InMemoryRecordSource, config: StatsConfig) -> Self {
        let clock: Clock = Arc::new(|| chrono::Local::now().naive_local());
        Self::build(source, config, clock)
    }

    pub fn with_clock(source: InMemoryRecordSource, config: StatsConfig, clock: Clock) -> Self {
        Self::build(source, config, clock)
    }

    fn build(source: InMemoryRecordSource, config: StatsConfig, clock: Clock) -> Self {
        let ctl = StatisticsController::new(Arc::new(source.clone()), &config)
            .with_clock(clock.clone());
        Self {
            source,
            config: Arc::new(config),
            clock,
            live: Arc::new(Mutex::new(ctl)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/stats", get(stats))
        .route("/records", get(list_records).post(add_record))
        .route("/categories", get(categories))
        .route("/stats/live", get(live_current))
        .route("/stats/live/window", post(live_select))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

type ApiError = (StatusCode, String);

#[derive(serde::Deserialize)]
struct StatsQuery {
    #[serde(default)]
    window: Option<String>,
    #[serde(default)]
    start: Option<NaiveDate>,
    #[serde(default)]
    end: Option<NaiveDate>,
}

/// Map query params to a selection event; custom dates win over `window`.
fn selection_from_query(q: &StatsQuery, fallback: Preset) -> Result<SelectionEvent, ApiError> {
    match (q.start, q.end) {
        (Some(start), Some(end)) => Ok(SelectionEvent::ChooseCustom { start, end }),
        (None, None) => {
            let preset = match q.window.as_deref() {
                Some(raw) => raw
                    .parse::<Preset>()
                    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?,
                None => fallback,
            };
            Ok(SelectionEvent::ChoosePreset(preset))
        }
        _ => Err((
            StatusCode::BAD_REQUEST,
            "custom window needs both start and end".to_string(),
        )),
    }
}

async fn stats(
    State(state): State<AppState>,
    Query(q): Query<StatsQuery>,
) -> Result<Json<StatsState>, ApiError> {
    let event = selection_from_query(&q, state.config.default_window)?;

    let selector =
        WindowSelector::with_bounds(state.config.default_window, state.config.date_bounds());
    let window = selector
        .validate(event)
        .map_err(|e| {
            metrics::counter!(crate::metrics::INVALID_WINDOW_TOTAL).increment(1);
            (StatusCode::BAD_REQUEST, e.to_string())
        })?
        .window();

    let out = controller::compute_once(&state.source, window, (state.clock)()).await;
    match out {
        StatsState::Failed { message } => Err((StatusCode::INTERNAL_SERVER_ERROR, message)),
        ready => Ok(Json(ready)),
    }
}

async fn list_records(
    State(state): State<AppState>,
    Query(q): Query<StatsQuery>,
) -> Result<Json<Vec<MoodRecord>>, ApiError> {
    let event = selection_from_query(&q, Preset::LastYear)?;
    let selector =
        WindowSelector::with_bounds(state.config.default_window, state.config.date_bounds());
    let window = selector
        .validate(event)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
        .window();
    let resolved = window.resolve_at((state.clock)());
    state
        .source
        .fetch(resolved)
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

#[derive(serde::Deserialize)]
struct NewRecordReq {
    category_label: String,
    /// Optional for built-in categories; looked up by label when missing.
    #[serde(default)]
    category_glyph: Option<String>,
    intensity: u8,
    #[serde(default)]
    note: String,
    /// Local time; "now" when absent.
    #[serde(default)]
    timestamp: Option<NaiveDateTime>,
}

async fn add_record(
    State(state): State<AppState>,
    Json(body): Json<NewRecordReq>,
) -> Result<(StatusCode, Json<MoodRecord>), ApiError> {
    let category = match body.category_glyph {
        Some(glyph) => EmotionCategory::new(0, body.category_label.trim(), glyph),
        None => builtin_by_label(&body.category_label).cloned().ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!(
                    "unknown category '{}' (pass category_glyph for custom ones)",
                    body.category_label
                ),
            )
        })?,
    };

    let ts = body.timestamp.unwrap_or_else(|| (state.clock)());
    let rec = state
        .source
        .insert_with_next_id(|id| MoodRecord::new(id, &category, body.intensity, body.note, ts))
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    tracing::debug!(
        target: "stats",
        id = rec.id,
        label = %rec.label(),
        intensity = rec.intensity,
        "record added"
    );
    Ok((StatusCode::CREATED, Json(rec)))
}

async fn categories() -> Json<Vec<EmotionCategory>> {
    Json(builtin_categories().to_vec())
}

fn lock_live(
    state: &AppState,
) -> Result<std::sync::MutexGuard<'_, StatisticsController>, ApiError> {
    state.live.lock().map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "live statistics lock poisoned".to_string(),
        )
    })
}

async fn live_current(State(state): State<AppState>) -> Result<Json<Published>, ApiError> {
    let mut ctl = lock_live(&state)?;
    if ctl.active().is_none() {
        ctl.start();
    }
    Ok(Json(ctl.current()))
}

#[derive(serde::Deserialize)]
struct SelectReq {
    #[serde(default)]
    window: Option<String>,
    #[serde(default)]
    start: Option<NaiveDate>,
    #[serde(default)]
    end: Option<NaiveDate>,
}

async fn live_select(
    State(state): State<AppState>,
    Json(body): Json<SelectReq>,
) -> Result<Json<Published>, ApiError> {
    let q = StatsQuery {
        window: body.window,
        start: body.start,
        end: body.end,
    };
    let event = selection_from_query(&q, state.config.default_window)?;

    let mut ctl = lock_live(&state)?;
    ctl.select(event)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(ctl.current()))
}
