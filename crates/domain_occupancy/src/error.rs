//! Occupancy domain errors

use thiserror::Error;

use core_kernel::PortError;

use crate::room::RoomStatus;

/// Errors that can occur in the occupancy domain
#[derive(Debug, Error)]
pub enum OccupancyError {
    /// The requested move is outside the legal-transition table
    #[error("Room {room_number}: illegal transition {from} -> {to}")]
    IllegalTransition {
        room_number: String,
        from: RoomStatus,
        to: RoomStatus,
    },

    /// The room is still in use and cannot be deactivated
    #[error("Room {room_number} cannot be deactivated: {reason}")]
    DeactivationBlocked { room_number: String, reason: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Port(#[from] PortError),
}
