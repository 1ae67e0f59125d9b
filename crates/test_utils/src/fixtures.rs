//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for the hotel domains. Fixtures are consistent
//! and predictable so tests can assert on exact amounts and dates.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::{Currency, Money, StayPeriod};
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// The standard nightly price used across tests
    pub fn nightly_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }

    /// A pricier room for surcharge arithmetic
    pub fn nightly_250() -> Money {
        Money::new(dec!(250.00), Currency::USD)
    }

    pub fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// A EUR amount for currency mismatch tests
    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::EUR)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// The reference "now" most tests start their clock at:
    /// 2024-01-01 15:00 UTC, a standard afternoon arrival
    pub fn arrival() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap()
    }

    /// 2024-01-03 11:00 UTC, the matching standard departure
    pub fn departure() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 3, 11, 0, 0).unwrap()
    }

    /// The standard two-night stay window
    pub fn two_night_stay() -> StayPeriod {
        StayPeriod::new(Self::arrival(), Self::departure()).unwrap()
    }

    /// An arbitrary instant on a given January 2024 day
    pub fn jan(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    pub fn guest_name() -> &'static str {
        "Avery Quinn"
    }

    pub fn guest_phone() -> &'static str {
        "+1-555-0100"
    }

    pub fn room_number() -> &'static str {
        "101"
    }

    pub fn desk_clerk() -> &'static str {
        "front-desk"
    }
}
