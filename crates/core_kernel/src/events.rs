//! Domain events and the notification sink
//!
//! Events describe facts that already happened; they are published
//! fire-and-forget to an external notifier after the owning document has
//! been written. A sink failure never fails the operation that produced
//! the event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::{BillId, GuestId, RoomId};
use crate::money::Money;

/// Events emitted by the lifecycle and ledger engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    GuestCheckedIn {
        guest_id: GuestId,
        room_id: RoomId,
        bill_id: BillId,
    },
    GuestCheckedOut {
        guest_id: GuestId,
        room_id: RoomId,
        checked_out_at: DateTime<Utc>,
    },
    StayExtended {
        guest_id: GuestId,
        new_check_out: DateTime<Utc>,
    },
    BillItemAdded {
        bill_id: BillId,
        amount: Money,
    },
    PaymentRecorded {
        bill_id: BillId,
        amount: Money,
    },
    BillFinalized {
        bill_id: BillId,
    },
    BillCancelled {
        bill_id: BillId,
    },
    /// Status names are carried as strings so the event stream does not
    /// depend on the occupancy domain's types
    RoomStatusChanged {
        room_id: RoomId,
        from: String,
        to: String,
    },
}

/// Fire-and-forget sink for domain events
///
/// Implementations must not block and must not propagate failure; anything
/// that can go wrong downstream is the notifier's problem.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

/// Sink that drops every event; the default when no notifier is wired up
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _event: DomainEvent) {}
}
