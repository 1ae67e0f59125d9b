//! Occupancy domain ports
//!
//! Besides its own store, this domain delegates two checks it cannot answer
//! itself: whether a checked-in guest still references a room (the stay
//! domain owns guests) and whether open tickets reference it (the ticketing
//! system is external). Both are narrow read-only ports so the deactivation
//! guard stays enforceable here without a dependency cycle.

use async_trait::async_trait;

use core_kernel::{DomainPort, GuestId, PortError, RoomId, Versioned};

use crate::room::{Room, RoomStatus};

/// Persistent store for rooms
#[async_trait]
pub trait RoomStore: DomainPort {
    /// Persists a newly provisioned room
    ///
    /// # Errors
    ///
    /// Returns `PortError::Conflict` if the room number is taken.
    async fn create(&self, room: Room) -> Result<Versioned<Room>, PortError>;

    /// Fetches a room by id
    async fn get(&self, id: RoomId) -> Result<Versioned<Room>, PortError>;

    /// Lists active rooms currently in the given status
    async fn list_by_status(&self, status: RoomStatus) -> Result<Vec<Versioned<Room>>, PortError>;

    /// Writes a room back, guarded by the version read earlier
    async fn update(
        &self,
        expected_version: u64,
        room: Room,
    ) -> Result<Versioned<Room>, PortError>;
}

/// Read-only view into the stay domain for the deactivation guard
#[async_trait]
pub trait StayLookup: DomainPort {
    /// The checked-in guest currently referencing this room, if any
    async fn checked_in_guest_for_room(
        &self,
        room_id: RoomId,
    ) -> Result<Option<GuestId>, PortError>;
}

/// Read-only view into the external ticketing system
#[async_trait]
pub trait TicketPort: DomainPort {
    /// Returns true if any open ticket references this room
    async fn has_open_tickets(&self, room_id: RoomId) -> Result<bool, PortError>;
}
