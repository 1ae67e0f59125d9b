//! Payments against a bill

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, PaymentId};

/// How a payment was tendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Online,
}

/// A recorded payment
///
/// Payments are append-only; a refund would be modeled as its own entry,
/// not an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub amount: Money,
    pub method: PaymentMethod,
    /// Gateway or receipt reference, if any
    pub reference: Option<String>,
    /// Staff member who took the payment
    pub received_by: String,
    pub received_at: DateTime<Utc>,
}

/// A payment not yet recorded on a bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDraft {
    pub amount: Money,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub received_by: String,
}

impl PaymentDraft {
    pub fn new(amount: Money, method: PaymentMethod, received_by: impl Into<String>) -> Self {
        Self {
            amount,
            method,
            reference: None,
            received_by: received_by.into(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Records the draft, producing the immutable payment entry
    pub fn record(self, received_at: DateTime<Utc>) -> Payment {
        Payment {
            id: PaymentId::new_v7(),
            amount: self.amount,
            method: self.method,
            reference: self.reference,
            received_by: self.received_by,
            received_at,
        }
    }
}
