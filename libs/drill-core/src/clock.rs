//! Calendar-day source for bucketing activity by date.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Timelike};
use std::sync::{Arc, Mutex, PoisonError};

/// Supplies the calendar day that answers are bucketed under.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall clock with a configurable start-of-day hour.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    daily_reset_hour: u32,
}

impl SystemClock {
    pub fn new(daily_reset_hour: u32) -> Self {
        Self {
            daily_reset_hour: daily_reset_hour.min(23),
        }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        adjusted_date(Local::now(), self.daily_reset_hour)
    }
}

/// Study day for `now`.
///
/// Before the reset hour the study day is still the previous calendar day,
/// so late-night practice counts towards the day it started on.
pub fn adjusted_date<Tz: TimeZone>(now: DateTime<Tz>, daily_reset_hour: u32) -> NaiveDate {
    if now.hour() < daily_reset_hour {
        (now - Duration::days(1)).date_naive()
    } else {
        now.date_naive()
    }
}

/// Manually driven clock. Clones share the same date.
#[derive(Debug, Clone)]
pub struct FixedClock {
    date: Arc<Mutex<NaiveDate>>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Arc::new(Mutex::new(date)),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        *self.date.lock().unwrap_or_else(PoisonError::into_inner) = date;
    }

    pub fn advance_days(&self, days: i64) {
        let mut date = self.date.lock().unwrap_or_else(PoisonError::into_inner);
        *date += Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.date.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
