//! Source of "today" for scheduling.
//!
//! Days are UTC calendar days unless the caller pins one explicitly.

use chrono::{NaiveDate, Utc};

pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// The current UTC calendar day.
#[derive(Clone, Copy, Debug, Default)]
pub struct UtcClock;

impl Clock for UtcClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Always reports the same day; used by tests and by `--today` on the command line.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}
