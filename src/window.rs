//! # Reporting Window
//! Rolling presets (last 7/30/90/180/365 days) and custom date ranges,
//! resolved to a half-open local-time interval `[start, end)`.
//!
//! Presets are relative to "now", so a window is re-resolved on every read.
//! Custom ranges are validated when they are built; an invalid range never
//! exists as a `TimeWindow` value.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::WindowError;

/// Fixed rolling periods offered by the statistics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    LastWeek,
    LastMonth,
    LastThreeMonths,
    LastSixMonths,
    LastYear,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::LastWeek,
        Preset::LastMonth,
        Preset::LastThreeMonths,
        Preset::LastSixMonths,
        Preset::LastYear,
    ];

    pub fn days(self) -> i64 {
        match self {
            Preset::LastWeek => 7,
            Preset::LastMonth => 30,
            Preset::LastThreeMonths => 90,
            Preset::LastSixMonths => 180,
            Preset::LastYear => 365,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Preset::LastWeek => "last_week",
            Preset::LastMonth => "last_month",
            Preset::LastThreeMonths => "last_three_months",
            Preset::LastSixMonths => "last_six_months",
            Preset::LastYear => "last_year",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = WindowError;

    /// Accepts the snake_case names plus short day forms (`7d`, `30d`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace('-', "_");
        match norm.as_str() {
            "last_week" | "week" | "7d" => Ok(Preset::LastWeek),
            "last_month" | "month" | "30d" => Ok(Preset::LastMonth),
            "last_three_months" | "last_3_months" | "90d" => Ok(Preset::LastThreeMonths),
            "last_six_months" | "last_6_months" | "180d" => Ok(Preset::LastSixMonths),
            "last_year" | "year" | "365d" => Ok(Preset::LastYear),
            _ => Err(WindowError::UnknownPreset(s.to_string())),
        }
    }
}

/// Inclusive sane bounds for custom dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBounds {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl Default for DateBounds {
    fn default() -> Self {
        Self {
            min: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN),
            max: NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

/// Validated custom range of whole local dates, end date inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CustomRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl CustomRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        Self::within(start, end, &DateBounds::default())
    }

    /// Rejects `start > end` and dates outside `bounds`. Never swaps or clamps.
    pub fn within(
        start: NaiveDate,
        end: NaiveDate,
        bounds: &DateBounds,
    ) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::StartAfterEnd { start, end });
        }
        for date in [start, end] {
            if date < bounds.min || date > bounds.max {
                return Err(WindowError::OutOfRange {
                    date,
                    min: bounds.min,
                    max: bounds.max,
                });
            }
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// The active reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Preset(Preset),
    Custom(CustomRange),
}

impl TimeWindow {
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        CustomRange::new(start, end).map(TimeWindow::Custom)
    }

    /// Resolve against the local wall clock.
    pub fn resolve(&self) -> ResolvedWindow {
        self.resolve_at(Local::now().naive_local())
    }

    /// Resolve against a caller-supplied "now".
    pub fn resolve_at(&self, now: NaiveDateTime) -> ResolvedWindow {
        match self {
            TimeWindow::Preset(p) => ResolvedWindow {
                start: now - Duration::days(p.days()),
                end: now,
            },
            TimeWindow::Custom(r) => {
                let end_day = r.end.succ_opt().unwrap_or(NaiveDate::MAX);
                ResolvedWindow {
                    start: r.start.and_time(NaiveTime::MIN),
                    end: end_day.and_time(NaiveTime::MIN),
                }
            }
        }
    }
}

impl From<Preset> for TimeWindow {
    fn from(p: Preset) -> Self {
        TimeWindow::Preset(p)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::Preset(p) => write!(f, "{p}"),
            TimeWindow::Custom(r) => write!(f, "custom({}..={})", r.start, r.end),
        }
    }
}

/// Half-open local-time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ResolvedWindow {
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts < self.end
    }

    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}
