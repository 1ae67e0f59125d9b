//! Ledger domain ports
//!
//! The [`BillStore`] trait is the seam between the engine and whatever
//! per-tenant document store the host platform provisions. Adapters must
//! enforce the version precondition on `update` and the uniqueness
//! constraints on `create`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{BillId, DomainPort, GuestId, Money, PortError, Versioned};

use crate::bill::Bill;

/// Persistent store for bills
#[async_trait]
pub trait BillStore: DomainPort {
    /// Persists a new bill
    ///
    /// # Errors
    ///
    /// Returns `PortError::Conflict` if the bill number is taken or the
    /// guest already has an open bill.
    async fn create(&self, bill: Bill) -> Result<Versioned<Bill>, PortError>;

    /// Fetches a bill by id
    async fn get(&self, id: BillId) -> Result<Versioned<Bill>, PortError>;

    /// Finds the guest's open (non-finalized, non-cancelled) bill, if any
    async fn find_open_for_guest(
        &self,
        guest_id: GuestId,
    ) -> Result<Option<Versioned<Bill>>, PortError>;

    /// Writes a bill back, guarded by the version read earlier
    ///
    /// # Errors
    ///
    /// Returns `PortError::Conflict` if the stored version no longer
    /// matches `expected_version`; the caller re-reads and retries.
    async fn update(
        &self,
        expected_version: u64,
        bill: Bill,
    ) -> Result<Versioned<Bill>, PortError>;
}

/// A finalized line from the external order collaborator
///
/// Orders arrive already priced; the engine folds them into the bill as
/// food charges without re-pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub food_name: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub total_price: Money,
}
