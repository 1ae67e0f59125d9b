use async_trait::async_trait;

use core_kernel::{DomainPort, GuestId, PortError, RoomId, Versioned};

use crate::guest::Guest;

/// Persistence port for guest stay records
#[async_trait]
pub trait GuestStore: DomainPort {
    async fn create(&self, guest: Guest) -> Result<Versioned<Guest>, PortError>;

    async fn get(&self, id: GuestId) -> Result<Versioned<Guest>, PortError>;

    /// Writes back under a version precondition; `Conflict` on a lost race
    async fn update(
        &self,
        expected_version: u64,
        guest: Guest,
    ) -> Result<Versioned<Guest>, PortError>;

    /// The checked-in guest currently assigned to the room, if any
    async fn find_checked_in_by_room(
        &self,
        room_id: RoomId,
    ) -> Result<Option<Versioned<Guest>>, PortError>;

    /// All checked-in guests, for the reconciliation pass
    async fn list_checked_in(&self) -> Result<Vec<Versioned<Guest>>, PortError>;
}
