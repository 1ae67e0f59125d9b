//! Occupancy orchestration
//!
//! All room writes go through [`OccupancyService`]: read a versioned
//! snapshot, apply the state-machine transition, write back under the
//! version precondition, retrying lost races. The service also enforces the
//! deactivation guard with its delegated lookups.

use std::sync::Arc;

use core_kernel::{Clock, DomainEvent, EventSink, GuestId, RoomId, Versioned};

use crate::error::OccupancyError;
use crate::ports::{RoomStore, StayLookup, TicketPort};
use crate::room::{Room, RoomStatus};

/// Upper bound on conflict retries before giving up
const MAX_WRITE_ATTEMPTS: u32 = 5;

/// Owns all occupancy-state mutations of rooms
pub struct OccupancyService {
    rooms: Arc<dyn RoomStore>,
    stays: Arc<dyn StayLookup>,
    tickets: Arc<dyn TicketPort>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl OccupancyService {
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        stays: Arc<dyn StayLookup>,
        tickets: Arc<dyn TicketPort>,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rooms,
            stays,
            tickets,
            events,
            clock,
        }
    }

    /// Fetches the current snapshot of a room
    pub async fn room(&self, id: RoomId) -> Result<Versioned<Room>, OccupancyError> {
        Ok(self.rooms.get(id).await?)
    }

    /// Check-in: available → occupied with the guest back-reference set
    pub async fn occupy(
        &self,
        room_id: RoomId,
        guest: GuestId,
    ) -> Result<Versioned<Room>, OccupancyError> {
        self.transition(room_id, RoomStatus::Occupied, Some(guest)).await
    }

    /// Checkout: occupied → cleaning
    ///
    /// The caller is responsible for arming the cleaning timer afterwards.
    pub async fn begin_cleaning(&self, room_id: RoomId) -> Result<Versioned<Room>, OccupancyError> {
        self.transition(room_id, RoomStatus::Cleaning, None).await
    }

    /// Checkout: occupied → cleaning, but only while the departing guest
    /// still holds the room
    ///
    /// Returns `None` when the room no longer references the guest, which
    /// is what a checkout retry sees after the room already cycled on,
    /// possibly into the next guest's stay. The stale retry must leave it
    /// alone.
    pub async fn release_by_guest(
        &self,
        room_id: RoomId,
        guest: GuestId,
    ) -> Result<Option<Versioned<Room>>, OccupancyError> {
        let mut attempts = 0;
        loop {
            let current = self.rooms.get(room_id).await?;
            if current.data.current_guest != Some(guest) {
                tracing::debug!(
                    room_number = %current.data.number,
                    %guest,
                    "room no longer held by this guest, leaving it untouched"
                );
                return Ok(None);
            }
            let mut room = current.data;
            let from = room.status;
            room.transition(RoomStatus::Cleaning, None, self.clock.now())?;

            match self.rooms.update(current.version, room).await {
                Ok(saved) => {
                    tracing::info!(
                        room_number = %saved.data.number,
                        %from,
                        to = %RoomStatus::Cleaning,
                        "room transitioned"
                    );
                    self.events.publish(DomainEvent::RoomStatusChanged {
                        room_id,
                        from: from.to_string(),
                        to: RoomStatus::Cleaning.to_string(),
                    });
                    return Ok(Some(saved));
                }
                Err(e) if e.is_conflict() && attempts < MAX_WRITE_ATTEMPTS => {
                    attempts += 1;
                    tracing::debug!(%room_id, attempts, "room write conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Manual override: cleaning or maintenance → available
    pub async fn make_available(&self, room_id: RoomId) -> Result<Versioned<Room>, OccupancyError> {
        self.transition(room_id, RoomStatus::Available, None).await
    }

    /// Manual detour: any non-occupied state → maintenance
    pub async fn set_maintenance(&self, room_id: RoomId) -> Result<Versioned<Room>, OccupancyError> {
        self.transition(room_id, RoomStatus::Maintenance, None).await
    }

    /// Releases a cleaning room back to available, but only if it is still
    /// cleaning when re-read
    ///
    /// Returns false if the room was manually moved on in the meantime (the
    /// stale timer or sweep fire is then a no-op).
    pub async fn try_complete_cleaning(&self, room_id: RoomId) -> Result<bool, OccupancyError> {
        let current = self.rooms.get(room_id).await?;
        if current.data.status != RoomStatus::Cleaning {
            tracing::debug!(
                room_number = %current.data.number,
                status = %current.data.status,
                "cleaning release superseded by an explicit status change"
            );
            return Ok(false);
        }
        match self.make_available(room_id).await {
            Ok(_) => Ok(true),
            // Lost the re-check race to an explicit change; still a no-op
            Err(OccupancyError::IllegalTransition { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Soft-deletes a room
    ///
    /// # Errors
    ///
    /// `DeactivationBlocked` while the room is occupied, referenced by a
    /// checked-in guest, or referenced by an open ticket.
    pub async fn deactivate(&self, room_id: RoomId) -> Result<Versioned<Room>, OccupancyError> {
        let mut attempts = 0;
        loop {
            let current = self.rooms.get(room_id).await?;
            let mut room = current.data;
            if !room.active {
                return Ok(Versioned::new(room, current.version));
            }
            if room.status == RoomStatus::Occupied {
                return Err(OccupancyError::DeactivationBlocked {
                    room_number: room.number,
                    reason: "room is occupied".into(),
                });
            }
            if let Some(guest) = self.stays.checked_in_guest_for_room(room_id).await? {
                return Err(OccupancyError::DeactivationBlocked {
                    room_number: room.number,
                    reason: format!("guest {guest} is still checked in"),
                });
            }
            if self.tickets.has_open_tickets(room_id).await? {
                return Err(OccupancyError::DeactivationBlocked {
                    room_number: room.number,
                    reason: "open tickets reference this room".into(),
                });
            }

            room.active = false;
            room.updated_at = self.clock.now();
            let number = room.number.clone();
            match self.rooms.update(current.version, room).await {
                Ok(saved) => {
                    tracing::info!(room_number = %number, "room deactivated");
                    return Ok(saved);
                }
                Err(e) if e.is_conflict() && attempts < MAX_WRITE_ATTEMPTS => {
                    attempts += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Read-modify-write transition with conflict retry
    async fn transition(
        &self,
        room_id: RoomId,
        to: RoomStatus,
        guest: Option<GuestId>,
    ) -> Result<Versioned<Room>, OccupancyError> {
        let mut attempts = 0;
        loop {
            let current = self.rooms.get(room_id).await?;
            let mut room = current.data;
            let from = room.status;
            room.transition(to, guest, self.clock.now())?;

            match self.rooms.update(current.version, room).await {
                Ok(saved) => {
                    tracing::info!(
                        room_number = %saved.data.number,
                        %from,
                        %to,
                        "room transitioned"
                    );
                    self.events.publish(DomainEvent::RoomStatusChanged {
                        room_id,
                        from: from.to_string(),
                        to: to.to_string(),
                    });
                    return Ok(saved);
                }
                Err(e) if e.is_conflict() && attempts < MAX_WRITE_ATTEMPTS => {
                    attempts += 1;
                    tracing::debug!(%room_id, attempts, "room write conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
