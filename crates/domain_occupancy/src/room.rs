//! The Room aggregate and its state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{GuestId, Money, RoomId};

use crate::error::OccupancyError;

/// Occupancy status of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Occupied,
    Cleaning,
    Maintenance,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Cleaning => "cleaning",
            RoomStatus::Maintenance => "maintenance",
        };
        write!(f, "{name}")
    }
}

/// A hotel room
///
/// Provisioned externally; this domain only governs its occupancy state.
/// `current_guest` is a lookup hint, not ownership: the guest record is the
/// source of truth for who is staying where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// Unique per tenant store
    pub number: String,
    pub capacity: u32,
    pub nightly_price: Money,
    pub status: RoomStatus,
    pub current_guest: Option<GuestId>,
    /// Set when the room entered cleaning; drives the dwell window
    pub cleaning_since: Option<DateTime<Utc>>,
    /// Deactivation is a soft delete; inactive rooms take no check-ins
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Registers a freshly provisioned room, available for check-in
    pub fn provision(
        number: impl Into<String>,
        capacity: u32,
        nightly_price: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RoomId::new_v7(),
            number: number.into(),
            capacity,
            nightly_price,
            status: RoomStatus::Available,
            current_guest: None,
            cleaning_since: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a status transition, enforcing the legal-transition table
    ///
    /// `guest` is required when entering `Occupied` and ignored otherwise;
    /// leaving `Occupied` clears the back-reference, keeping the
    /// occupied ⇔ guest-set invariant by construction.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` for any move outside the table; the status is
    /// never silently coerced.
    pub fn transition(
        &mut self,
        to: RoomStatus,
        guest: Option<GuestId>,
        now: DateTime<Utc>,
    ) -> Result<(), OccupancyError> {
        use RoomStatus::*;
        match (self.status, to) {
            (Available, Occupied) => {
                let guest = guest.ok_or_else(|| {
                    OccupancyError::Validation("occupying a room requires a guest".into())
                })?;
                self.current_guest = Some(guest);
            }
            (Occupied, Cleaning) => {
                self.current_guest = None;
                self.cleaning_since = Some(now);
            }
            (Cleaning, Available) => {
                self.cleaning_since = None;
            }
            (Available | Cleaning, Maintenance) => {
                self.cleaning_since = None;
            }
            (Maintenance, Available) => {}
            (from, to) => {
                return Err(OccupancyError::IllegalTransition {
                    room_number: self.number.clone(),
                    from,
                    to,
                })
            }
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn room() -> Room {
        Room::provision("101", 2, Money::new(dec!(1000), Currency::USD), now())
    }

    #[test]
    fn full_stay_cycle() {
        let mut room = room();
        let guest = GuestId::new();

        room.transition(RoomStatus::Occupied, Some(guest), now()).unwrap();
        assert_eq!(room.current_guest, Some(guest));

        room.transition(RoomStatus::Cleaning, None, now()).unwrap();
        assert_eq!(room.current_guest, None);
        assert!(room.cleaning_since.is_some());

        room.transition(RoomStatus::Available, None, now()).unwrap();
        assert!(room.cleaning_since.is_none());
    }

    #[test]
    fn occupying_requires_a_guest() {
        let mut room = room();
        assert!(matches!(
            room.transition(RoomStatus::Occupied, None, now()),
            Err(OccupancyError::Validation(_))
        ));
        assert_eq!(room.status, RoomStatus::Available);
    }

    #[test]
    fn occupied_room_cannot_go_straight_to_available() {
        let mut room = room();
        room.transition(RoomStatus::Occupied, Some(GuestId::new()), now())
            .unwrap();

        assert!(matches!(
            room.transition(RoomStatus::Available, None, now()),
            Err(OccupancyError::IllegalTransition { .. })
        ));
        assert_eq!(room.status, RoomStatus::Occupied);
    }

    #[test]
    fn occupied_room_cannot_enter_maintenance() {
        let mut room = room();
        room.transition(RoomStatus::Occupied, Some(GuestId::new()), now())
            .unwrap();

        assert!(matches!(
            room.transition(RoomStatus::Maintenance, None, now()),
            Err(OccupancyError::IllegalTransition { .. })
        ));
    }

    #[test]
    fn maintenance_detour_and_back() {
        let mut room = room();
        room.transition(RoomStatus::Maintenance, None, now()).unwrap();
        room.transition(RoomStatus::Available, None, now()).unwrap();
        assert_eq!(room.status, RoomStatus::Available);
    }
}
