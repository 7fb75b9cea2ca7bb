//! snapshot.rs: output shapes of the statistics engine.
//!
//! A snapshot is always replaced as a whole, never patched. `StatsState`
//! keeps "still loading", "failed" and "computed, possibly zero records"
//! apart so a consumer never mistakes one for another.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::window::ResolvedWindow;

/// Dominant record for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub category_label: String,
    pub category_glyph: String,
    pub intensity: u8,
}

/// Full derived aggregate for one record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub total_records: usize,
    /// `None` means no data. Never read it as an intensity of zero.
    pub average_intensity: Option<f64>,
    /// Keyed by composite label (`"😊 Happy"`).
    pub counts_by_category: BTreeMap<String, usize>,
    pub distribution_by_category: BTreeMap<String, f64>,
    pub average_intensity_by_category: BTreeMap<String, f64>,
    /// Any label holding the maximum count; which one under ties is unspecified.
    pub most_frequent_category: Option<String>,
    /// Ascending by date, one point per date with data.
    pub daily_trend: Vec<DailyPoint>,
    /// Records per intensity level, index 0 = intensity 1.
    pub intensity_histogram: [usize; 5],
    pub active_days: usize,
    pub first_record_at: Option<NaiveDateTime>,
    pub last_record_at: Option<NaiveDateTime>,
}

impl StatisticsSnapshot {
    /// The "computed, zero records" snapshot.
    pub fn empty() -> Self {
        Self {
            total_records: 0,
            average_intensity: None,
            counts_by_category: BTreeMap::new(),
            distribution_by_category: BTreeMap::new(),
            average_intensity_by_category: BTreeMap::new(),
            most_frequent_category: None,
            daily_trend: Vec::new(),
            intensity_histogram: [0; 5],
            active_days: 0,
            first_record_at: None,
            last_record_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }
}

impl Default for StatisticsSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// What a consumer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatsState {
    /// Nothing computed yet for the current window.
    Loading,
    Ready {
        window: ResolvedWindow,
        snapshot: StatisticsSnapshot,
    },
    Failed {
        message: String,
    },
}

impl StatsState {
    pub fn snapshot(&self) -> Option<&StatisticsSnapshot> {
        match self {
            StatsState::Ready { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, StatsState::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_serializes_average_as_null() {
        let v = serde_json::to_value(StatisticsSnapshot::empty()).unwrap();
        assert!(v["average_intensity"].is_null());
        assert_eq!(v["total_records"], 0);
        assert!(v["daily_trend"].as_array().unwrap().is_empty());
    }

    #[test]
    fn states_are_tagged() {
        let v = serde_json::to_value(StatsState::Loading).unwrap();
        assert_eq!(v["status"], "loading");
        let v = serde_json::to_value(StatsState::Failed {
            message: "disk".into(),
        })
        .unwrap();
        assert_eq!(v["status"], "failed");
        assert_eq!(v["message"], "disk");
    }
}
