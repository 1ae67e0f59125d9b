//! The automatic charge calculator
//!
//! A pure function from a stay period and a nightly price to the set of
//! automatic charges: one room charge per night plus optional early/late
//! surcharges. Every draft carries a charge key derived from its type and
//! date, so re-running the calculator over a longer period and appending
//! the result only adds the genuinely new nights. No persistence, no clock:
//! the same inputs always produce the same sheet.

use chrono::Duration;
use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{Money, PeriodError, StayPeriod};
use domain_ledger::{ChargeDraft, ChargeType};

use crate::policy::HotelPolicy;

/// Errors from charge calculation
#[derive(Debug, Error)]
pub enum CalculationError {
    #[error(transparent)]
    Period(#[from] PeriodError),

    #[error("Charge policy violation: {0}")]
    Policy(String),
}

/// Totals of a calculated charge sheet
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeSummary {
    pub nights: i64,
    pub base_total: Money,
    pub early_fee: Option<Money>,
    pub late_fee: Option<Money>,
    pub total: Money,
}

/// The automatic charges for a stay, ready to append to a bill
#[derive(Debug, Clone)]
pub struct ChargeSheet {
    pub items: Vec<ChargeDraft>,
    pub summary: ChargeSummary,
}

/// Seam for the charge policy
///
/// Implementations must be pure: identical inputs produce identical drafts
/// with identical charge keys.
pub trait ChargeCalculator: Send + Sync + 'static {
    fn calculate(
        &self,
        period: StayPeriod,
        nightly_price: Money,
    ) -> Result<ChargeSheet, CalculationError>;
}

/// The standard calculator driven by [`HotelPolicy`]
pub struct PolicyCalculator {
    policy: HotelPolicy,
}

impl PolicyCalculator {
    pub fn new(policy: HotelPolicy) -> Self {
        Self { policy }
    }
}

impl ChargeCalculator for PolicyCalculator {
    fn calculate(
        &self,
        period: StayPeriod,
        nightly_price: Money,
    ) -> Result<ChargeSheet, CalculationError> {
        if nightly_price.is_negative() {
            return Err(CalculationError::Policy(format!(
                "nightly price {nightly_price} must not be negative"
            )));
        }

        let currency = nightly_price.currency();
        let mut items = Vec::new();
        let mut base_total = Money::zero(currency);
        for date in period.night_dates() {
            base_total = base_total
                .checked_add(&nightly_price)
                .map_err(|e| CalculationError::Policy(e.to_string()))?;
            items.push(
                ChargeDraft::new(
                    ChargeType::RoomCharge,
                    format!("Room charge - night of {date}"),
                    nightly_price,
                )
                .with_quantity(Decimal::ONE, nightly_price)
                .with_charge_key(format!("room:{date}")),
            );
        }

        let early_cutoff =
            self.policy.standard_check_in - Duration::minutes(self.policy.early_grace_minutes);
        let early_fee = if period.check_in().time() < early_cutoff {
            let fee = nightly_price.multiply(self.policy.early_fee_fraction);
            let date = period.check_in().date_naive();
            items.push(
                ChargeDraft::new(
                    ChargeType::ServiceCharge,
                    format!("Early check-in surcharge ({date})"),
                    fee,
                )
                .with_charge_key(format!("early-checkin:{date}")),
            );
            Some(fee)
        } else {
            None
        };

        let late_cutoff =
            self.policy.standard_check_out + Duration::minutes(self.policy.late_grace_minutes);
        let late_fee = if period.check_out().time() > late_cutoff {
            let fee = nightly_price.multiply(self.policy.late_fee_fraction);
            let date = period.check_out().date_naive();
            items.push(
                ChargeDraft::new(
                    ChargeType::ServiceCharge,
                    format!("Late check-out surcharge ({date})"),
                    fee,
                )
                .with_charge_key(format!("late-checkout:{date}")),
            );
            Some(fee)
        } else {
            None
        };

        let mut total = base_total;
        for fee in [early_fee, late_fee].into_iter().flatten() {
            total = total
                .checked_add(&fee)
                .map_err(|e| CalculationError::Policy(e.to_string()))?;
        }

        Ok(ChargeSheet {
            items,
            summary: ChargeSummary {
                nights: period.nights(),
                base_total,
                early_fee,
                late_fee,
                total,
            },
        })
    }
}
