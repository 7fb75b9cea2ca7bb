//! Window selector: the two-state machine behind the statistics period picker.
//!
//! `PresetSelected(preset)` <-> `CustomSelected(range)`; no terminal state.
//! A custom selection is validated before the transition, so a rejected
//! event leaves the current state untouched.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::WindowError;
use crate::window::{CustomRange, DateBounds, Preset, ResolvedWindow, TimeWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectorState {
    PresetSelected { preset: Preset },
    CustomSelected { range: CustomRange },
}

impl SelectorState {
    pub fn window(&self) -> TimeWindow {
        match *self {
            SelectorState::PresetSelected { preset } => TimeWindow::Preset(preset),
            SelectorState::CustomSelected { range } => TimeWindow::Custom(range),
        }
    }
}

/// UI-level selection events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    ChoosePreset(Preset),
    ChooseCustom { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone)]
pub struct WindowSelector {
    state: SelectorState,
    bounds: DateBounds,
}

impl WindowSelector {
    pub fn new(initial: Preset) -> Self {
        Self::with_bounds(initial, DateBounds::default())
    }

    pub fn with_bounds(initial: Preset, bounds: DateBounds) -> Self {
        Self {
            state: SelectorState::PresetSelected { preset: initial },
            bounds,
        }
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    pub fn window(&self) -> TimeWindow {
        self.state.window()
    }

    /// Check an event without applying it.
    pub fn validate(&self, event: SelectionEvent) -> Result<SelectorState, WindowError> {
        match event {
            SelectionEvent::ChoosePreset(preset) => Ok(SelectorState::PresetSelected { preset }),
            SelectionEvent::ChooseCustom { start, end } => {
                let range = CustomRange::within(start, end, &self.bounds)?;
                Ok(SelectorState::CustomSelected { range })
            }
        }
    }

    /// Apply an event. On error the selector keeps its previous state.
    pub fn apply(&mut self, event: SelectionEvent) -> Result<SelectorState, WindowError> {
        let next = self.validate(event)?;
        self.state = next;
        Ok(next)
    }

    /// Preset intervals move with the clock, so this is recomputed per call.
    pub fn resolve_at(&self, now: NaiveDateTime) -> ResolvedWindow {
        self.window().resolve_at(now)
    }

    pub fn resolve(&self) -> ResolvedWindow {
        self.window().resolve()
    }
}

impl Default for WindowSelector {
    fn default() -> Self {
        Self::new(Preset::LastWeek)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn preset_and_custom_transitions() {
        let mut sel = WindowSelector::default();
        assert_eq!(
            sel.state(),
            SelectorState::PresetSelected {
                preset: Preset::LastWeek
            }
        );

        sel.apply(SelectionEvent::ChooseCustom {
            start: d(2024, 1, 1),
            end: d(2024, 1, 10),
        })
        .unwrap();
        match sel.state() {
            SelectorState::CustomSelected { range } => {
                assert_eq!(range.start(), d(2024, 1, 1));
                assert_eq!(range.end(), d(2024, 1, 10));
            }
            other => panic!("expected custom selection, got {other:?}"),
        }

        sel.apply(SelectionEvent::ChoosePreset(Preset::LastYear)).unwrap();
        assert_eq!(sel.window(), TimeWindow::Preset(Preset::LastYear));
    }

    #[test]
    fn rejected_custom_keeps_previous_state() {
        let mut sel = WindowSelector::new(Preset::LastMonth);
        let err = sel
            .apply(SelectionEvent::ChooseCustom {
                start: d(2024, 2, 1),
                end: d(2024, 1, 1),
            })
            .unwrap_err();
        assert!(matches!(err, WindowError::StartAfterEnd { .. }));
        assert_eq!(sel.window(), TimeWindow::Preset(Preset::LastMonth));
    }

    #[test]
    fn bounds_are_enforced() {
        let bounds = DateBounds {
            min: d(2023, 1, 1),
            max: d(2030, 1, 1),
        };
        let sel = WindowSelector::with_bounds(Preset::LastWeek, bounds);
        assert!(sel
            .validate(SelectionEvent::ChooseCustom {
                start: d(2022, 12, 31),
                end: d(2023, 1, 2),
            })
            .is_err());
    }
}
