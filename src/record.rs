//! # Mood Records
//! Logged entries and the emotion categories they point at.
//!
//! A record copies its category's label and glyph at write time, so renaming
//! or deleting a category later never rewrites history. Statistics group by
//! the composite `"<glyph> <label>"` string, not by category id.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::StatsError;

pub const MIN_INTENSITY: u8 = 1;
pub const MAX_INTENSITY: u8 = 5;

static BUILTIN_CATEGORIES: Lazy<Vec<EmotionCategory>> = Lazy::new(|| {
    let raw = include_str!("../default_categories.json");
    serde_json::from_str::<Vec<EmotionCategory>>(raw).expect("valid default category catalog")
});

/// Identity of a selectable mood. Built-in or user-defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionCategory {
    pub id: i64,
    pub label: String,
    /// Short symbol (usually an emoji) used as a compact chart label.
    pub glyph: String,
}

impl EmotionCategory {
    pub fn new(id: i64, label: impl Into<String>, glyph: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            glyph: glyph.into(),
        }
    }

    pub fn composite_label(&self) -> String {
        composite_label(&self.glyph, &self.label)
    }
}

/// Categories shipped with the journal.
pub fn builtin_categories() -> &'static [EmotionCategory] {
    &BUILTIN_CATEGORIES
}

/// Look up a built-in category by its label (case-insensitive).
pub fn builtin_by_label(label: &str) -> Option<&'static EmotionCategory> {
    BUILTIN_CATEGORIES
        .iter()
        .find(|c| c.label.eq_ignore_ascii_case(label.trim()))
}

/// One logged entry. Immutable from the statistics side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodRecord {
    pub id: i64,
    pub category_label: String,
    pub category_glyph: String,
    /// 1..=5
    pub intensity: u8,
    #[serde(default)]
    pub note: String,
    /// Local civil time; day grouping uses `timestamp.date()`.
    pub timestamp: NaiveDateTime,
}

impl MoodRecord {
    /// Build a record from a category, copying its label and glyph.
    pub fn new(
        id: i64,
        category: &EmotionCategory,
        intensity: u8,
        note: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Result<Self, StatsError> {
        let rec = Self {
            id,
            category_label: category.label.clone(),
            category_glyph: category.glyph.clone(),
            intensity,
            note: note.into(),
            timestamp,
        };
        rec.check_intensity()?;
        Ok(rec)
    }

    /// Grouping key, e.g. `"😊 Happy"`.
    pub fn label(&self) -> String {
        composite_label(&self.category_glyph, &self.category_label)
    }

    pub fn local_date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn check_intensity(&self) -> Result<(), StatsError> {
        if (MIN_INTENSITY..=MAX_INTENSITY).contains(&self.intensity) {
            Ok(())
        } else {
            Err(StatsError::InvalidIntensity {
                record_id: self.id,
                intensity: self.intensity,
            })
        }
    }
}

#[inline]
pub fn composite_label(glyph: &str, label: &str) -> String {
    format!("{glyph} {label}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn composite_label_is_glyph_space_label() {
        let happy = EmotionCategory::new(1, "Happy", "😊");
        assert_eq!(happy.composite_label(), "😊 Happy");

        let rec = MoodRecord::new(10, &happy, 3, "", ts("2024-01-01 09:30")).unwrap();
        assert_eq!(rec.label(), "😊 Happy");
        assert_eq!(rec.local_date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn same_name_different_glyph_stays_distinct() {
        let a = EmotionCategory::new(1, "Happy", "😊");
        let b = EmotionCategory::new(2, "Happy", "😁");
        assert_ne!(a.composite_label(), b.composite_label());
    }

    #[test]
    fn new_rejects_out_of_range_intensity() {
        let sad = EmotionCategory::new(2, "Sad", "😢");
        let err = MoodRecord::new(7, &sad, 0, "", ts("2024-01-02 10:00")).unwrap_err();
        assert_eq!(
            err,
            StatsError::InvalidIntensity {
                record_id: 7,
                intensity: 0
            }
        );
        assert!(MoodRecord::new(8, &sad, 6, "", ts("2024-01-02 10:00")).is_err());
        assert!(MoodRecord::new(9, &sad, 5, "", ts("2024-01-02 10:00")).is_ok());
    }

    #[test]
    fn builtin_catalog_loads() {
        let cats = builtin_categories();
        assert!(cats.len() >= 5);
        let happy = builtin_by_label(" happy ").expect("happy is built in");
        assert_eq!(happy.glyph, "😊");
        assert!(builtin_by_label("Bored").is_none());
    }
}
