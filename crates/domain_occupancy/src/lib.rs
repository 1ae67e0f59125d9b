//! Occupancy Domain - room availability and its legal transitions
//!
//! A [`Room`] cycles available → occupied → cleaning → available every stay;
//! maintenance is a manual detour from any non-occupied state. Illegal
//! transitions fail loudly, never coerce. Entering cleaning arms a one-shot
//! [`CleaningTimer`] that re-validates the room's current status before
//! releasing it, so a stale timer can never undo a manual override.
//!
//! # Invariants
//!
//! - a room is occupied iff `current_guest` is set
//! - a room cannot be deactivated while occupied or referenced by a
//!   checked-in guest or an open ticket

pub mod error;
pub mod ports;
pub mod room;
pub mod service;
pub mod timer;

pub use error::OccupancyError;
pub use ports::{RoomStore, StayLookup, TicketPort};
pub use room::{Room, RoomStatus};
pub use service::OccupancyService;
pub use timer::{CleaningTimer, HousekeepingPolicy};
