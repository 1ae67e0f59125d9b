//! The checkout guard
//!
//! No guest leaves with money owing. The guard reads the guest's open bill
//! and answers whether checkout may proceed; the controller calls
//! [`CheckoutGuard::ensure_clear`] immediately before finalizing, and the
//! ledger's finalize re-checks the balance under its version precondition,
//! so a charge landing between the two checks still cannot slip through.

use std::sync::Arc;

use core_kernel::{Currency, GuestId, Money};
use domain_ledger::LedgerEngine;

use crate::error::StayError;

/// The guard's verdict on a checkout attempt
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutClearance {
    pub allowed: bool,
    pub balance: Money,
    pub bill_number: Option<String>,
}

/// Enforces the zero-balance-before-checkout invariant
pub struct CheckoutGuard {
    ledger: Arc<LedgerEngine>,
    currency: Currency,
}

impl CheckoutGuard {
    pub fn new(ledger: Arc<LedgerEngine>, currency: Currency) -> Self {
        Self { ledger, currency }
    }

    /// Reports whether the guest may check out and what they still owe
    ///
    /// A guest without an open bill is clear by definition.
    pub async fn can_check_out(&self, guest_id: GuestId) -> Result<CheckoutClearance, StayError> {
        let Some(bill) = self.ledger.open_bill_for_guest(guest_id).await? else {
            return Ok(CheckoutClearance {
                allowed: true,
                balance: Money::zero(self.currency),
                bill_number: None,
            });
        };

        let balance = bill.data.balance_amount;
        Ok(CheckoutClearance {
            allowed: !balance.is_positive(),
            balance,
            bill_number: Some(bill.data.bill_number),
        })
    }

    /// Like [`can_check_out`](Self::can_check_out), but a blocked checkout
    /// is an error
    pub async fn ensure_clear(&self, guest_id: GuestId) -> Result<CheckoutClearance, StayError> {
        let clearance = self.can_check_out(guest_id).await?;
        if !clearance.allowed {
            return Err(StayError::BalanceOutstanding {
                bill_number: clearance
                    .bill_number
                    .clone()
                    .unwrap_or_else(|| "unknown".into()),
                balance: clearance.balance,
            });
        }
        Ok(clearance)
    }
}
