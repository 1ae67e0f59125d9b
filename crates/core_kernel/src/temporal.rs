//! Stay periods and the injectable clock
//!
//! A stay is a half-open window between a contracted check-in and check-out
//! instant. Night counting lives here so the charge calculator and the
//! reconciliation job agree on it by construction.
//!
//! Time is always read through the [`Clock`] trait: production code uses
//! [`SystemClock`], tests use [`ManualClock`] to drive dwell windows and
//! reconciliation cadences deterministically.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

/// Errors related to stay periods
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Invalid period: check-out {check_out} must be after check-in {check_in}")]
    InvalidPeriod {
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    },
}

/// The contracted window of a stay
///
/// Invariant: `check_out > check_in`. Construction is the only way to get a
/// `StayPeriod`, so holders never need to re-validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayPeriod {
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
}

impl StayPeriod {
    /// Creates a new stay period
    ///
    /// # Errors
    ///
    /// Returns `PeriodError::InvalidPeriod` unless `check_out > check_in`.
    pub fn new(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> Result<Self, PeriodError> {
        if check_out <= check_in {
            return Err(PeriodError::InvalidPeriod {
                check_in,
                check_out,
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn check_in(&self) -> DateTime<Utc> {
        self.check_in
    }

    pub fn check_out(&self) -> DateTime<Utc> {
        self.check_out
    }

    /// Number of chargeable nights: ceil(duration / 1 day)
    ///
    /// A 15:00 → 11:00 two-day stay is 2 nights; any partial day rounds up.
    pub fn nights(&self) -> i64 {
        let seconds = (self.check_out - self.check_in).num_seconds();
        (seconds + 86_399) / 86_400
    }

    /// The calendar dates of each chargeable night, starting at the
    /// check-in date
    pub fn night_dates(&self) -> Vec<NaiveDate> {
        let first = self.check_in.date_naive();
        (0..self.nights())
            .map(|offset| first + Duration::days(offset))
            .collect()
    }

    /// Returns true if this period contains the given instant
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.check_in && instant < self.check_out
    }
}

/// A source of the current time
///
/// Every component that needs "now" receives a `Clock` so that delayed
/// transitions and reconciliation sweeps are testable without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually-advanced clock for deterministic tests
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock poisoned");
        *now += by;
    }

    /// Jumps the clock to an absolute instant
    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().expect("clock poisoned");
        *now = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock poisoned")
    }
}
