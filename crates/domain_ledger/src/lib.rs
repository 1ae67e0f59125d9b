//! Ledger Domain - the financial record of a stay
//!
//! A [`Bill`] owns the ordered line items and payments of one stay. Its
//! totals and status are never stored independently: `recompute` derives
//! them from the items and payments by pure sum reduction, and
//! [`Bill::status`] is a computed projection of the numbers. The
//! [`LedgerEngine`] is the only writer; every mutation is a read-modify-write
//! against the [`BillStore`] port guarded by a version precondition, so
//! concurrent writers never lose an update.
//!
//! # Invariants
//!
//! - `total_amount = subtotal + tax_amount - discount_amount`
//! - `balance_amount = total_amount - paid_amount`
//! - a finalized or cancelled bill is immutable
//! - payments never push `paid_amount` above `total_amount`

pub mod bill;
pub mod engine;
pub mod error;
pub mod item;
pub mod payment;
pub mod ports;

pub use bill::{Bill, BillSnapshot, BillStatus};
pub use engine::LedgerEngine;
pub use error::LedgerError;
pub use item::{BillItem, ChargeDraft, ChargeType};
pub use payment::{Payment, PaymentDraft, PaymentMethod};
pub use ports::{BillStore, OrderLine};
