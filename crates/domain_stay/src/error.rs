use chrono::{DateTime, Utc};
use thiserror::Error;

use core_kernel::{GuestId, Money, PeriodError, PortError};
use domain_ledger::LedgerError;
use domain_occupancy::{OccupancyError, RoomStatus};

use crate::guest::GuestStatus;

/// Errors from the stay lifecycle
#[derive(Debug, Error)]
pub enum StayError {
    #[error("Room {room_number} is not available (status: {status})")]
    RoomUnavailable {
        room_number: String,
        status: RoomStatus,
    },

    #[error("Room {room_number} is already occupied by guest {guest_id}")]
    RoomOccupiedByOther {
        room_number: String,
        guest_id: GuestId,
    },

    #[error("Guest {guest_id} is not checked in (status: {status})")]
    NotCheckedIn {
        guest_id: GuestId,
        status: GuestStatus,
    },

    #[error("Requested check-out {requested} must be after the current check-out {current}")]
    InvalidDate {
        current: DateTime<Utc>,
        requested: DateTime<Utc>,
    },

    #[error("Bill {bill_number} has an outstanding balance of {balance}")]
    BalanceOutstanding {
        bill_number: String,
        balance: Money,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Period(#[from] PeriodError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Occupancy(#[from] OccupancyError),

    #[error(transparent)]
    Port(#[from] PortError),
}
