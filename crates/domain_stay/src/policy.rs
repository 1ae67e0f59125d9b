//! House rules for check-in/check-out times and surcharges

use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Times and surcharge fractions of the property
///
/// Surcharges are expressed as a fraction of the room's nightly price. A
/// guest arriving more than `early_grace_minutes` before the standard
/// check-in time incurs the early fee; symmetrically for late departures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotelPolicy {
    pub standard_check_in: NaiveTime,
    pub standard_check_out: NaiveTime,
    pub early_grace_minutes: i64,
    pub late_grace_minutes: i64,
    pub early_fee_fraction: Decimal,
    pub late_fee_fraction: Decimal,
}

impl Default for HotelPolicy {
    fn default() -> Self {
        Self {
            standard_check_in: NaiveTime::from_hms_opt(15, 0, 0)
                .unwrap_or(NaiveTime::MIN),
            standard_check_out: NaiveTime::from_hms_opt(11, 0, 0)
                .unwrap_or(NaiveTime::MIN),
            early_grace_minutes: 60,
            late_grace_minutes: 60,
            early_fee_fraction: dec!(0.5),
            late_fee_fraction: dec!(0.5),
        }
    }
}
