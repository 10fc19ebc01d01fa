//! SM-2 (SuperMemo 2) spaced repetition algorithm implementation.
//!
//! The SM-2 algorithm calculates review intervals based on recall quality:
//! - Each card has an easiness factor (EF) that adjusts based on performance
//! - Lapses (quality < 3): repetitions reset and the card comes back tomorrow; EF is kept
//! - Successes (quality 3-5): interval grows progressively (1 day → 6 days → EF multiplier)
//! - EF is recomputed after each success and has a minimum value of 1.3
//!
//! Intervals past the second repetition are `round(previous_interval * EF)` using the
//! freshly recomputed EF. `f64::round` rounds half away from zero, which is round-half-up
//! for the positive values involved here.

use super::Grade;
use crate::error::{Result, SchedulerError};
use chrono::{Days, NaiveDate};

pub const INITIAL_EASINESS: f64 = 2.5;
pub const MIN_EASINESS: f64 = 1.3;
pub const LAPSE_INTERVAL: u32 = 1;
pub const FIRST_INTERVAL: u32 = 1;
pub const SECOND_INTERVAL: u32 = 6;
/// Upper bound on interval growth, roughly a century.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// The scalar part of a card's scheduling state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sm2State {
    pub easiness_factor: f64,
    pub repetitions: u32,
    pub interval: u32,
}

impl Default for Sm2State {
    /// State of a card that has never been reviewed.
    fn default() -> Self {
        Self {
            easiness_factor: INITIAL_EASINESS,
            repetitions: 0,
            interval: 0,
        }
    }
}

/// Calculates the next state according to the SM-2 algorithm.
pub fn next_state(state: Sm2State, grade: Grade) -> Sm2State {
    if grade.is_lapse() {
        return Sm2State {
            easiness_factor: state.easiness_factor,
            repetitions: 0,
            interval: LAPSE_INTERVAL,
        };
    }

    let easiness_factor = next_easiness(state.easiness_factor, grade.quality());
    let repetitions = state.repetitions.saturating_add(1);
    let interval = match repetitions {
        1 => FIRST_INTERVAL,
        2 => SECOND_INTERVAL,
        _ => {
            let grown = (state.interval as f64 * easiness_factor).round();
            grown.min(MAX_INTERVAL_DAYS as f64) as u32
        }
    };

    Sm2State {
        easiness_factor,
        repetitions,
        interval,
    }
}

/// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3.
pub fn next_easiness(easiness_factor: f64, quality: u8) -> f64 {
    let distance = 5.0 - f64::from(quality.min(5));
    let updated = easiness_factor + (0.1 - distance * (0.08 + distance * 0.02));
    updated.max(MIN_EASINESS)
}

/// Calendar date `interval` days after `today`.
pub fn next_review_date(today: NaiveDate, interval: u32) -> Result<NaiveDate> {
    today
        .checked_add_days(Days::new(u64::from(interval)))
        .ok_or_else(|| {
            SchedulerError::InvalidInput(format!(
                "interval of {} days from {} is out of the calendar range",
                interval, today
            ))
        })
}
