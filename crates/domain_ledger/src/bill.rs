//! The Bill aggregate
//!
//! A bill's monetary fields are always derived from its items and payments
//! by [`Bill::recompute`]; the status is a pure projection of those numbers
//! plus the checkout and cancellation flags. Nothing here talks to a store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{BillId, Currency, GuestId, Money, RoomId};

use crate::item::{BillItem, ChargeType};
use crate::payment::Payment;

/// Derived bill status
///
/// Evaluated in order: a settled bill of a checked-out guest is `Finalized`
/// (overriding `Paid`); a settled bill with a positive total is `Paid`;
/// partial payment is `PartiallyPaid`; otherwise the bill is `Active`.
/// `Cancelled` is an administrative void and trumps everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Active,
    PartiallyPaid,
    Paid,
    Finalized,
    Cancelled,
}

impl BillStatus {
    /// Returns true if the bill may still take items and payments
    pub fn is_open(&self) -> bool {
        !matches!(self, BillStatus::Finalized | BillStatus::Cancelled)
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BillStatus::Active => "active",
            BillStatus::PartiallyPaid => "partially_paid",
            BillStatus::Paid => "paid",
            BillStatus::Finalized => "finalized",
            BillStatus::Cancelled => "cancelled",
        };
        write!(f, "{name}")
    }
}

/// Guest and room identity captured at bill creation
///
/// Denormalized so the bill stays readable after the guest record turns
/// terminal or the room is renumbered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillSnapshot {
    pub guest_id: GuestId,
    pub guest_name: String,
    pub room_id: RoomId,
    pub room_number: String,
}

/// The financial record of one stay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    /// Human-readable unique bill number
    pub bill_number: String,
    pub guest_id: GuestId,
    pub guest_name: String,
    pub room_id: RoomId,
    pub room_number: String,
    pub currency: Currency,
    pub items: Vec<BillItem>,
    pub payments: Vec<Payment>,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub discount_amount: Money,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub balance_amount: Money,
    pub is_guest_checked_out: bool,
    pub cancelled: bool,
    /// Stamped the first time the bill derives as finalized; never
    /// overwritten afterwards
    pub finalized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// Opens a new empty bill for a stay
    pub fn open(snapshot: BillSnapshot, currency: Currency, now: DateTime<Utc>) -> Self {
        let id = BillId::new_v7();
        Self {
            id,
            bill_number: generate_bill_number(now, id),
            guest_id: snapshot.guest_id,
            guest_name: snapshot.guest_name,
            room_id: snapshot.room_id,
            room_number: snapshot.room_number,
            currency,
            items: Vec::new(),
            payments: Vec::new(),
            subtotal: Money::zero(currency),
            tax_amount: Money::zero(currency),
            discount_amount: Money::zero(currency),
            total_amount: Money::zero(currency),
            paid_amount: Money::zero(currency),
            balance_amount: Money::zero(currency),
            is_guest_checked_out: false,
            cancelled: false,
            finalized_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The derived status; never stored, never set directly
    pub fn status(&self) -> BillStatus {
        if self.cancelled {
            return BillStatus::Cancelled;
        }
        let settled = !self.balance_amount.is_positive();
        if settled && self.is_guest_checked_out {
            return BillStatus::Finalized;
        }
        if settled && self.total_amount.is_positive() {
            return BillStatus::Paid;
        }
        if self.paid_amount.is_positive() {
            return BillStatus::PartiallyPaid;
        }
        BillStatus::Active
    }

    /// Re-derives every monetary field from the items and payments
    ///
    /// Idempotent and order-independent: the fields are pure sums over the
    /// collections. Also stamps `finalized_at` the first time the bill
    /// derives as finalized.
    pub fn recompute(&mut self, now: DateTime<Utc>) {
        let zero = Money::zero(self.currency);

        self.subtotal = self
            .items
            .iter()
            .filter(|i| i.charge_type.counts_toward_subtotal())
            .fold(zero, |acc, i| acc + i.amount);
        self.tax_amount = self
            .items
            .iter()
            .filter(|i| i.charge_type == ChargeType::Tax)
            .fold(zero, |acc, i| acc + i.amount);
        self.discount_amount = self
            .items
            .iter()
            .filter(|i| i.charge_type == ChargeType::Discount)
            .fold(zero, |acc, i| acc + i.amount.abs());

        self.total_amount = self.subtotal + self.tax_amount - self.discount_amount;
        if self.total_amount.is_negative() {
            // Anomaly, not an error: discounts exceeding charges are kept
            // as-is for the front desk to sort out.
            tracing::warn!(
                bill_number = %self.bill_number,
                total = %self.total_amount,
                "bill total is negative"
            );
        }

        self.paid_amount = self.payments.iter().fold(zero, |acc, p| acc + p.amount);
        self.balance_amount = self.total_amount - self.paid_amount;
        self.updated_at = now;

        if self.status() == BillStatus::Finalized && self.finalized_at.is_none() {
            self.finalized_at = Some(now);
        }
    }

    /// Returns true if an automatic charge with this identity is already
    /// on the bill
    pub fn has_charge_key(&self, key: &str) -> bool {
        self.items
            .iter()
            .any(|i| i.charge_key.as_deref() == Some(key))
    }

    /// Returns true if the given external order was already folded in
    pub fn has_order(&self, order_id: core_kernel::OrderId) -> bool {
        self.items
            .iter()
            .any(|i| i.source_order_id == Some(order_id))
    }

    /// The charge keys of every automatic item currently on the bill
    pub fn charge_keys(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|i| i.charge_key.as_deref())
            .collect()
    }
}

/// Generates a unique human-readable bill number
///
/// The date prefix keeps numbers scannable; the id suffix keeps two bills
/// opened in the same instant distinct. The suffix is taken from the tail
/// of the uuid, which holds the random bits of a v7 id.
fn generate_bill_number(now: DateTime<Utc>, id: BillId) -> String {
    let hex = id.as_uuid().simple().to_string();
    format!("BILL-{}-{}", now.format("%Y%m%d"), &hex[hex.len() - 8..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ChargeDraft;
    use crate::payment::{PaymentDraft, PaymentMethod};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    fn bill_with(items: Vec<ChargeDraft>, payments: Vec<Money>) -> Bill {
        let snapshot = BillSnapshot {
            guest_id: GuestId::new(),
            guest_name: "Avery Quinn".into(),
            room_id: RoomId::new(),
            room_number: "101".into(),
        };
        let mut bill = Bill::open(snapshot, Currency::USD, now());
        for draft in items {
            bill.items.push(draft.post(now()));
        }
        for amount in payments {
            bill.payments
                .push(PaymentDraft::new(amount, PaymentMethod::Cash, "desk").record(now()));
        }
        bill.recompute(now());
        bill
    }

    #[test]
    fn totals_fold_tax_and_discount() {
        let bill = bill_with(
            vec![
                ChargeDraft::new(ChargeType::RoomCharge, "Night", usd(dec!(1000))),
                ChargeDraft::new(ChargeType::ServiceCharge, "Laundry", usd(dec!(200))),
                ChargeDraft::new(ChargeType::Tax, "VAT", usd(dec!(120))),
                ChargeDraft::new(ChargeType::Discount, "Voucher", usd(dec!(-100))),
            ],
            vec![],
        );

        assert_eq!(bill.subtotal, usd(dec!(1200)));
        assert_eq!(bill.tax_amount, usd(dec!(120)));
        assert_eq!(bill.discount_amount, usd(dec!(100)));
        assert_eq!(bill.total_amount, usd(dec!(1220)));
        assert_eq!(bill.balance_amount, usd(dec!(1220)));
        assert_eq!(bill.status(), BillStatus::Active);
    }

    #[test]
    fn status_tracks_payment_progress() {
        let charge = ChargeDraft::new(ChargeType::RoomCharge, "Night", usd(dec!(1000)));

        let partial = bill_with(vec![charge.clone()], vec![usd(dec!(400))]);
        assert_eq!(partial.status(), BillStatus::PartiallyPaid);

        let paid = bill_with(vec![charge], vec![usd(dec!(1000))]);
        assert_eq!(paid.status(), BillStatus::Paid);
    }

    #[test]
    fn empty_bill_is_active_not_paid() {
        let bill = bill_with(vec![], vec![]);
        assert_eq!(bill.status(), BillStatus::Active);
    }

    #[test]
    fn finalized_overrides_paid_and_is_stamped_once() {
        let mut bill = bill_with(
            vec![ChargeDraft::new(
                ChargeType::RoomCharge,
                "Night",
                usd(dec!(1000)),
            )],
            vec![usd(dec!(1000))],
        );
        bill.is_guest_checked_out = true;
        bill.recompute(now());

        assert_eq!(bill.status(), BillStatus::Finalized);
        let stamped = bill.finalized_at;
        assert!(stamped.is_some());

        bill.recompute(now() + chrono::Duration::hours(1));
        assert_eq!(bill.finalized_at, stamped);
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut bill = bill_with(
            vec![ChargeDraft::new(
                ChargeType::RoomCharge,
                "Night",
                usd(dec!(1000)),
            )],
            vec![usd(dec!(300))],
        );
        let before = (bill.subtotal, bill.total_amount, bill.balance_amount);
        bill.recompute(now());
        assert_eq!(
            before,
            (bill.subtotal, bill.total_amount, bill.balance_amount)
        );
    }

    #[test]
    fn negative_total_is_kept_not_clamped() {
        let bill = bill_with(
            vec![
                ChargeDraft::new(ChargeType::RoomCharge, "Night", usd(dec!(100))),
                ChargeDraft::new(ChargeType::Discount, "Comp", usd(dec!(250))),
            ],
            vec![],
        );
        assert_eq!(bill.total_amount, usd(dec!(-150)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::item::ChargeDraft;
    use crate::payment::{PaymentDraft, PaymentMethod};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn charge_type_strategy() -> impl Strategy<Value = ChargeType> {
        prop_oneof![
            Just(ChargeType::RoomCharge),
            Just(ChargeType::FoodOrder),
            Just(ChargeType::ServiceCharge),
            Just(ChargeType::Tax),
            Just(ChargeType::Discount),
            Just(ChargeType::Other),
        ]
    }

    proptest! {
        #[test]
        fn invariants_hold_for_any_items_and_payments(
            items in proptest::collection::vec(
                (charge_type_strategy(), -500_000i64..500_000i64), 0..20),
            payments in proptest::collection::vec(0i64..500_000i64, 0..10),
        ) {
            let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
            let snapshot = BillSnapshot {
                guest_id: GuestId::new(),
                guest_name: "Guest".into(),
                room_id: RoomId::new(),
                room_number: "1".into(),
            };
            let mut bill = Bill::open(snapshot, Currency::USD, now);
            for (charge_type, minor) in items {
                bill.items.push(
                    ChargeDraft::new(
                        charge_type,
                        "item",
                        Money::from_minor(minor, Currency::USD),
                    )
                    .post(now),
                );
            }
            for minor in payments {
                bill.payments.push(
                    PaymentDraft::new(
                        Money::from_minor(minor, Currency::USD),
                        PaymentMethod::Cash,
                        "desk",
                    )
                    .record(now),
                );
            }
            bill.recompute(now);

            prop_assert_eq!(
                bill.total_amount,
                bill.subtotal + bill.tax_amount - bill.discount_amount
            );
            prop_assert_eq!(bill.balance_amount, bill.total_amount - bill.paid_amount);

            // Order independence: reversing the collections changes nothing
            bill.items.reverse();
            bill.payments.reverse();
            let (total, balance) = (bill.total_amount, bill.balance_amount);
            bill.recompute(now);
            prop_assert_eq!(bill.total_amount, total);
            prop_assert_eq!(bill.balance_amount, balance);
        }
    }
}
