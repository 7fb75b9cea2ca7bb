//! # Statistics Engine
//! Pure, testable aggregation that maps a record set → `StatisticsSnapshot`.
//! No I/O, no clock, no shared state.
//!
//! Grouping key is the composite `"<glyph> <label>"` string. The daily trend
//! is sparse: one point per local date that has records, holding the record
//! with the highest intensity that day. Tie-breaks for the most frequent
//! category and the dominant record are stable for a given input order but
//! not part of the contract.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::StatsError;
use crate::record::{MoodRecord, MIN_INTENSITY};
use crate::snapshot::{DailyPoint, StatisticsSnapshot};

#[derive(Debug, Default, Clone, Copy)]
struct LabelAcc {
    count: usize,
    intensity_sum: u64,
}

/// Compute the full snapshot for `records`.
///
/// Fails only on malformed input (intensity outside 1..=5); nothing is
/// clamped or skipped.
pub fn compute(records: &[MoodRecord]) -> Result<StatisticsSnapshot, StatsError> {
    // 0) Integrity check before any aggregation
    for r in records {
        r.check_intensity()?;
    }
    if records.is_empty() {
        return Ok(StatisticsSnapshot::empty());
    }

    // 1) Single pass: per-label accumulators, histogram, per-day dominant, span
    let mut by_label: BTreeMap<String, LabelAcc> = BTreeMap::new();
    let mut dominant: BTreeMap<NaiveDate, &MoodRecord> = BTreeMap::new();
    let mut histogram = [0usize; 5];
    let mut intensity_sum: u64 = 0;
    let mut first: Option<NaiveDateTime> = None;
    let mut last: Option<NaiveDateTime> = None;

    for r in records {
        let acc = by_label.entry(r.label()).or_default();
        acc.count += 1;
        acc.intensity_sum += u64::from(r.intensity);

        intensity_sum += u64::from(r.intensity);
        histogram[usize::from(r.intensity - MIN_INTENSITY)] += 1;

        // first-encountered record wins among equal intensities
        match dominant.entry(r.local_date()) {
            Entry::Vacant(slot) => {
                slot.insert(r);
            }
            Entry::Occupied(mut slot) => {
                if r.intensity > slot.get().intensity {
                    slot.insert(r);
                }
            }
        }

        first = Some(first.map_or(r.timestamp, |t| t.min(r.timestamp)));
        last = Some(last.map_or(r.timestamp, |t| t.max(r.timestamp)));
    }

    // 2) Derived per-label maps
    let total = records.len();
    let total_f = total as f64;

    let mut counts = BTreeMap::new();
    let mut distribution = BTreeMap::new();
    let mut averages = BTreeMap::new();
    for (label, acc) in &by_label {
        counts.insert(label.clone(), acc.count);
        distribution.insert(label.clone(), acc.count as f64 / total_f);
        averages.insert(label.clone(), acc.intensity_sum as f64 / acc.count as f64);
    }

    // 3) Most frequent: one max-reduction pass
    let most_frequent = most_frequent_label(&counts);

    // 4) Sparse daily trend (BTreeMap keeps dates ascending)
    let daily_trend: Vec<DailyPoint> = dominant
        .into_iter()
        .map(|(date, r)| DailyPoint {
            date,
            category_label: r.category_label.clone(),
            category_glyph: r.category_glyph.clone(),
            intensity: r.intensity,
        })
        .collect();

    Ok(StatisticsSnapshot {
        total_records: total,
        average_intensity: Some(intensity_sum as f64 / total_f),
        counts_by_category: counts,
        distribution_by_category: distribution,
        average_intensity_by_category: averages,
        most_frequent_category: most_frequent,
        active_days: daily_trend.len(),
        daily_trend,
        intensity_histogram: histogram,
        first_record_at: first,
        last_record_at: last,
    })
}

fn most_frequent_label(counts: &BTreeMap<String, usize>) -> Option<String> {
    counts
        .iter()
        .fold(None::<(&String, usize)>, |best, (label, &n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((label, n)),
        })
        .map(|(label, _)| label.clone())
}
