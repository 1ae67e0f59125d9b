//! Ledger domain errors

use thiserror::Error;

use core_kernel::{Money, MoneyError, PortError};

use crate::bill::BillStatus;

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The bill is terminal and cannot be mutated
    #[error("Bill {bill_number} is {status} and cannot be modified")]
    InvalidState {
        bill_number: String,
        status: BillStatus,
    },

    /// The payment would push the paid amount above the total; rejected
    /// wholesale, never partially accepted or clamped
    #[error("Overpayment rejected: {attempted} against total {total} with {paid} already paid")]
    Overpayment {
        attempted: Money,
        total: Money,
        paid: Money,
    },

    /// Finalization attempted while the guest still owes money
    #[error("Bill {bill_number} still has {balance} outstanding")]
    OutstandingBalance { bill_number: String, balance: Money },

    /// Malformed input, rejected before any mutation
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Store error: {0}")]
    Port(#[from] PortError),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn invalid_state(bill_number: impl Into<String>, status: BillStatus) -> Self {
        LedgerError::InvalidState {
            bill_number: bill_number.into(),
            status,
        }
    }
}
