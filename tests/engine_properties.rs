// tests/engine_properties.rs
//
// Property checks for the statistics engine over seeded random record sets,
// plus the fixed reference scenarios.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use mood_stats::record::{builtin_categories, EmotionCategory, MoodRecord};
use mood_stats::{compute, StatsError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn random_records(seed: u64, n: usize, span_days: i64) -> Vec<MoodRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let cats = builtin_categories();
    (0..n)
        .map(|i| {
            let cat = &cats[rng.random_range(0..cats.len())];
            let minutes = rng.random_range(0..span_days * 24 * 60);
            MoodRecord::new(
                i as i64,
                cat,
                rng.random_range(1..=5u8),
                "",
                base() + Duration::minutes(minutes),
            )
            .unwrap()
        })
        .collect()
}

#[test]
fn distribution_sums_to_one() {
    for seed in 0..25 {
        let records = random_records(seed, 1 + (seed as usize * 7) % 90, 60);
        let s = compute(&records).unwrap();
        let sum: f64 = s.distribution_by_category.values().sum();
        assert!((sum - 1.0).abs() < 1e-4, "seed {seed}: sum {sum}");
    }
}

#[test]
fn counts_and_averages_match_subsets() {
    for seed in 100..120 {
        let records = random_records(seed, 80, 30);
        let s = compute(&records).unwrap();

        let mut subsets: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for r in &records {
            subsets.entry(r.label()).or_default().push(r.intensity);
        }

        assert_eq!(s.counts_by_category.len(), subsets.len());
        for (label, xs) in &subsets {
            assert_eq!(s.counts_by_category[label], xs.len());
            let mean = xs.iter().map(|&x| x as f64).sum::<f64>() / xs.len() as f64;
            assert!((s.average_intensity_by_category[label] - mean).abs() < 1e-9);
        }

        let overall =
            records.iter().map(|r| r.intensity as f64).sum::<f64>() / records.len() as f64;
        assert!((s.average_intensity.unwrap() - overall).abs() < 1e-9);
        assert_eq!(s.intensity_histogram.iter().sum::<usize>(), records.len());
    }
}

#[test]
fn most_frequent_has_maximal_count() {
    for seed in 200..230 {
        let records = random_records(seed, 15, 10);
        let s = compute(&records).unwrap();
        let max = *s.counts_by_category.values().max().unwrap();
        let winner = s.most_frequent_category.as_ref().unwrap();
        assert_eq!(s.counts_by_category[winner], max);
    }
}

#[test]
fn trend_is_one_point_per_distinct_date_with_max_intensity() {
    for seed in 300..320 {
        // sparse data over a long span: many days have no records
        let records = random_records(seed, 20, 365);
        let s = compute(&records).unwrap();

        let dates: BTreeSet<NaiveDate> = records.iter().map(|r| r.local_date()).collect();
        assert_eq!(s.daily_trend.len(), dates.len());
        assert_eq!(s.active_days, dates.len());

        let trend_dates: Vec<NaiveDate> = s.daily_trend.iter().map(|p| p.date).collect();
        assert_eq!(trend_dates, dates.into_iter().collect::<Vec<_>>());

        for p in &s.daily_trend {
            let max = records
                .iter()
                .filter(|r| r.local_date() == p.date)
                .map(|r| r.intensity)
                .max()
                .unwrap();
            assert_eq!(p.intensity, max, "date {}", p.date);
            assert!(records.iter().any(|r| r.local_date() == p.date
                && r.category_label == p.category_label
                && r.category_glyph == p.category_glyph
                && r.intensity == p.intensity));
        }
    }
}

#[test]
fn reference_scenario_one() {
    let happy = EmotionCategory::new(1, "Happy", "😊");
    let sad = EmotionCategory::new(2, "Sad", "😢");
    let day = |d: u32, h: u32| {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    };
    let records = vec![
        MoodRecord::new(1, &happy, 4, "walk", day(1, 9)).unwrap(),
        MoodRecord::new(2, &happy, 2, "", day(1, 18)).unwrap(),
        MoodRecord::new(3, &sad, 3, "", day(2, 11)).unwrap(),
    ];
    let s = compute(&records).unwrap();

    assert_eq!(s.total_records, 3);
    assert_eq!(s.average_intensity, Some(3.0));
    assert_eq!(s.counts_by_category.get("😊 Happy"), Some(&2));
    assert_eq!(s.counts_by_category.get("😢 Sad"), Some(&1));
    assert!((s.distribution_by_category["😊 Happy"] - 0.667).abs() < 1e-3);
    assert!((s.distribution_by_category["😢 Sad"] - 0.333).abs() < 1e-3);
    assert_eq!(s.average_intensity_by_category["😊 Happy"], 3.0);
    assert_eq!(s.average_intensity_by_category["😢 Sad"], 3.0);
    assert_eq!(s.most_frequent_category.as_deref(), Some("😊 Happy"));

    let trend: Vec<_> = s
        .daily_trend
        .iter()
        .map(|p| (p.date.to_string(), p.category_label.as_str(), p.intensity))
        .collect();
    assert_eq!(
        trend,
        vec![
            ("2024-01-01".to_string(), "Happy", 4),
            ("2024-01-02".to_string(), "Sad", 3)
        ]
    );
}

#[test]
fn reference_scenario_two_empty() {
    let s = compute(&[]).unwrap();
    assert_eq!(s.total_records, 0);
    assert!(s.average_intensity.is_none());
    assert!(s.counts_by_category.is_empty());
    assert!(s.distribution_by_category.is_empty());
    assert!(s.most_frequent_category.is_none());
    assert!(s.daily_trend.is_empty());
}

#[test]
fn corrupt_record_fails_whole_computation() {
    let mut records = random_records(9, 10, 5);
    records[4].intensity = 0;
    let id = records[4].id;
    assert_eq!(
        compute(&records),
        Err(StatsError::InvalidIntensity {
            record_id: id,
            intensity: 0
        })
    );
}
