//! Time source for answer creation.
//!
//! Answers are stamped with the UTC calendar day they were logged on. The
//! clock is injectable so tests can log answers on different days.

use chrono::{DateTime, NaiveDate, Utc};

#[cfg(test)]
use chrono::NaiveTime;
#[cfg(test)]
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day used for `created_on`. Always the UTC day.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Test builds only.
#[cfg(test)]
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Start at midnight UTC of the given day
    pub fn at_day(day: NaiveDate) -> Self {
        Self::new(day.and_time(NaiveTime::MIN).and_utc())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut current) = self.now.lock() {
            *current = now;
        }
    }

    pub fn set_day(&self, day: NaiveDate) {
        self.set(day.and_time(NaiveTime::MIN).and_utc());
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_today_uses_utc_day() {
        // 23:30 UTC is still the 14th, whatever the local zone says
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 14, 23, 30, 0).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
    }

    #[test]
    fn test_fixed_clock_set_day() {
        let clock = FixedClock::at_day(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        clock.set_day(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }
}
