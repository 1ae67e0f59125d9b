//! The Ledger Engine
//!
//! The only writer of bills. Every operation is a read-modify-write against
//! the [`BillStore`]: read a versioned snapshot, apply the mutation, derive
//! the totals, write back under the version precondition. A lost race
//! surfaces as a conflict and is resolved by re-reading and re-applying, so
//! two concurrent `add_item` calls both land (neither update is lost).

use chrono::{DateTime, Utc};
use std::sync::Arc;

use core_kernel::{
    BillId, Clock, Currency, DomainEvent, EventSink, GuestId, OrderId, Versioned,
};

use crate::bill::{Bill, BillSnapshot, BillStatus};
use crate::error::LedgerError;
use crate::item::{ChargeDraft, ChargeType};
use crate::payment::PaymentDraft;
use crate::ports::{BillStore, OrderLine};

/// Upper bound on conflict retries before giving up
const MAX_WRITE_ATTEMPTS: u32 = 5;

/// Outcome of applying a mutation closure to a bill
enum Mutation {
    /// Nothing changed; skip the write (keeps the operation idempotent)
    Noop,
    /// Write the bill back and publish these events afterwards
    Write(Vec<DomainEvent>),
}

/// Owns all financial mutations of bills
pub struct LedgerEngine {
    bills: Arc<dyn BillStore>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl LedgerEngine {
    pub fn new(bills: Arc<dyn BillStore>, events: Arc<dyn EventSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            bills,
            events,
            clock,
        }
    }

    /// Opens a new bill with its initial charges
    pub async fn open_bill(
        &self,
        snapshot: BillSnapshot,
        currency: Currency,
        initial_charges: Vec<ChargeDraft>,
    ) -> Result<Versioned<Bill>, LedgerError> {
        let now = self.clock.now();
        let mut bill = Bill::open(snapshot, currency, now);
        for draft in initial_charges {
            ensure_currency(&bill, draft.amount.currency())?;
            bill.items.push(draft.post(now));
        }
        bill.recompute(now);

        let saved = self.bills.create(bill).await?;
        tracing::info!(
            bill_number = %saved.data.bill_number,
            total = %saved.data.total_amount,
            "bill opened"
        );
        Ok(saved)
    }

    /// Fetches the current snapshot of a bill
    pub async fn bill(&self, id: BillId) -> Result<Versioned<Bill>, LedgerError> {
        Ok(self.bills.get(id).await?)
    }

    /// Finds the guest's open bill, if any
    pub async fn open_bill_for_guest(
        &self,
        guest_id: GuestId,
    ) -> Result<Option<Versioned<Bill>>, LedgerError> {
        Ok(self.bills.find_open_for_guest(guest_id).await?)
    }

    /// Appends a line item
    pub async fn add_item(
        &self,
        bill_id: BillId,
        draft: ChargeDraft,
    ) -> Result<Versioned<Bill>, LedgerError> {
        self.mutate(bill_id, |bill, now| {
            ensure_open(bill)?;
            ensure_currency(bill, draft.amount.currency())?;
            let amount = draft.amount;
            bill.items.push(draft.clone().post(now));
            Ok(Mutation::Write(vec![DomainEvent::BillItemAdded {
                bill_id: bill.id,
                amount,
            }]))
        })
        .await
    }

    /// Records a payment
    ///
    /// # Errors
    ///
    /// - `Validation` if the amount is negative
    /// - `Overpayment` if the payment would push the paid amount above the
    ///   total; the payment is rejected wholesale
    /// - `InvalidState` if the bill is finalized or cancelled
    pub async fn add_payment(
        &self,
        bill_id: BillId,
        draft: PaymentDraft,
    ) -> Result<Versioned<Bill>, LedgerError> {
        if draft.amount.is_negative() {
            return Err(LedgerError::validation("payment amount must not be negative"));
        }
        self.mutate(bill_id, |bill, now| {
            ensure_open(bill)?;
            ensure_currency(bill, draft.amount.currency())?;

            let prospective = bill.paid_amount + draft.amount;
            if prospective > bill.total_amount {
                return Err(LedgerError::Overpayment {
                    attempted: draft.amount,
                    total: bill.total_amount,
                    paid: bill.paid_amount,
                });
            }

            let amount = draft.amount;
            bill.payments.push(draft.clone().record(now));
            tracing::info!(
                bill_number = %bill.bill_number,
                amount = %amount,
                "payment recorded"
            );
            Ok(Mutation::Write(vec![DomainEvent::PaymentRecorded {
                bill_id: bill.id,
                amount,
            }]))
        })
        .await
    }

    /// Appends only the automatic charges whose identity is not yet on the
    /// bill; returns the bill and how many items were actually appended
    ///
    /// Re-running with the same drafts is a no-op, which is what makes the
    /// reconciliation task idempotent.
    pub async fn append_charges(
        &self,
        bill_id: BillId,
        drafts: &[ChargeDraft],
    ) -> Result<(Versioned<Bill>, usize), LedgerError> {
        let mut attempts = 0;
        loop {
            let current = self.bills.get(bill_id).await?;
            let mut bill = current.data;
            ensure_open(&bill)?;

            let now = self.clock.now();
            let missing: Vec<&ChargeDraft> = drafts
                .iter()
                .filter(|d| match d.charge_key.as_deref() {
                    Some(key) => !bill.has_charge_key(key),
                    None => true,
                })
                .collect();
            if missing.is_empty() {
                return Ok((Versioned::new(bill, current.version), 0));
            }

            let appended = missing.len();
            let mut events = Vec::with_capacity(appended);
            for draft in missing {
                ensure_currency(&bill, draft.amount.currency())?;
                events.push(DomainEvent::BillItemAdded {
                    bill_id: bill.id,
                    amount: draft.amount,
                });
                bill.items.push(draft.clone().post(now));
            }
            bill.recompute(now);

            match self.bills.update(current.version, bill).await {
                Ok(saved) => {
                    for event in events {
                        self.events.publish(event);
                    }
                    return Ok((saved, appended));
                }
                Err(e) if e.is_conflict() && attempts < MAX_WRITE_ATTEMPTS => {
                    attempts += 1;
                    tracing::debug!(%bill_id, attempts, "bill write conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Folds a finalized external order into the bill as food charges
    ///
    /// Idempotent per order id: a re-delivered order changes nothing.
    pub async fn fold_order(
        &self,
        bill_id: BillId,
        order_id: OrderId,
        lines: &[OrderLine],
    ) -> Result<Versioned<Bill>, LedgerError> {
        self.mutate(bill_id, |bill, now| {
            if bill.has_order(order_id) {
                return Ok(Mutation::Noop);
            }
            ensure_open(bill)?;

            let mut events = Vec::with_capacity(lines.len());
            for line in lines {
                ensure_currency(bill, line.total_price.currency())?;
                let draft = ChargeDraft::new(
                    ChargeType::FoodOrder,
                    line.food_name.clone(),
                    line.total_price,
                )
                .with_quantity(line.quantity, line.unit_price)
                .with_source_order(order_id);
                events.push(DomainEvent::BillItemAdded {
                    bill_id: bill.id,
                    amount: draft.amount,
                });
                bill.items.push(draft.post(now));
            }
            Ok(Mutation::Write(events))
        })
        .await
    }

    /// Marks the guest as checked out and lets the bill derive as finalized
    ///
    /// Idempotent: finalizing a finalized bill returns it unchanged, so the
    /// checkout sequence can be retried after a crash.
    ///
    /// # Errors
    ///
    /// - `OutstandingBalance` if the balance is still positive
    /// - `InvalidState` if the bill is cancelled
    pub async fn finalize(&self, bill_id: BillId) -> Result<Versioned<Bill>, LedgerError> {
        self.mutate(bill_id, |bill, _now| {
            match bill.status() {
                BillStatus::Finalized => return Ok(Mutation::Noop),
                BillStatus::Cancelled => {
                    return Err(LedgerError::invalid_state(
                        bill.bill_number.clone(),
                        BillStatus::Cancelled,
                    ))
                }
                _ => {}
            }
            if bill.balance_amount.is_positive() {
                return Err(LedgerError::OutstandingBalance {
                    bill_number: bill.bill_number.clone(),
                    balance: bill.balance_amount,
                });
            }
            bill.is_guest_checked_out = true;
            tracing::info!(bill_number = %bill.bill_number, "bill finalized");
            Ok(Mutation::Write(vec![DomainEvent::BillFinalized {
                bill_id: bill.id,
            }]))
        })
        .await
    }

    /// Administrative void for a stay that ends without charges being owed
    /// (cancellation, no-show)
    ///
    /// # Errors
    ///
    /// Refused once the bill is finalized or any payment has been taken.
    pub async fn cancel(&self, bill_id: BillId) -> Result<Versioned<Bill>, LedgerError> {
        self.mutate(bill_id, |bill, _now| {
            if bill.cancelled {
                return Ok(Mutation::Noop);
            }
            if bill.status() == BillStatus::Finalized {
                return Err(LedgerError::invalid_state(
                    bill.bill_number.clone(),
                    BillStatus::Finalized,
                ));
            }
            if !bill.payments.is_empty() {
                return Err(LedgerError::validation(
                    "a bill with recorded payments cannot be cancelled",
                ));
            }
            bill.cancelled = true;
            tracing::info!(bill_number = %bill.bill_number, "bill cancelled");
            Ok(Mutation::Write(vec![DomainEvent::BillCancelled {
                bill_id: bill.id,
            }]))
        })
        .await
    }

    /// Read-modify-write loop with conflict retry
    async fn mutate<F>(&self, bill_id: BillId, op: F) -> Result<Versioned<Bill>, LedgerError>
    where
        F: Fn(&mut Bill, DateTime<Utc>) -> Result<Mutation, LedgerError>,
    {
        let mut attempts = 0;
        loop {
            let current = self.bills.get(bill_id).await?;
            let mut bill = current.data;
            let now = self.clock.now();

            match op(&mut bill, now)? {
                Mutation::Noop => return Ok(Versioned::new(bill, current.version)),
                Mutation::Write(events) => {
                    bill.recompute(now);
                    match self.bills.update(current.version, bill).await {
                        Ok(saved) => {
                            for event in events {
                                self.events.publish(event);
                            }
                            return Ok(saved);
                        }
                        Err(e) if e.is_conflict() && attempts < MAX_WRITE_ATTEMPTS => {
                            attempts += 1;
                            tracing::debug!(%bill_id, attempts, "bill write conflict, retrying");
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }
    }
}

/// Mutation guard: terminal bills are immutable
fn ensure_open(bill: &Bill) -> Result<(), LedgerError> {
    let status = bill.status();
    if !status.is_open() {
        return Err(LedgerError::invalid_state(bill.bill_number.clone(), status));
    }
    Ok(())
}

fn ensure_currency(bill: &Bill, currency: Currency) -> Result<(), LedgerError> {
    if currency != bill.currency {
        return Err(LedgerError::Validation(format!(
            "currency {currency} does not match bill currency {}",
            bill.currency
        )));
    }
    Ok(())
}
