// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod record;
pub mod selector;
pub mod snapshot;
pub mod source;
pub mod window;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::controller::{observe_statistics, Published, StatisticsController, Subscription};
pub use crate::engine::compute;
pub use crate::error::{StatsError, WindowError};
pub use crate::record::{EmotionCategory, MoodRecord};
pub use crate::snapshot::{DailyPoint, StatisticsSnapshot, StatsState};
pub use crate::source::{InMemoryRecordSource, RecordSource};
pub use crate::window::{Preset, ResolvedWindow, TimeWindow};
