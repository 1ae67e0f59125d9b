//! Core Kernel - Foundational types for the hotel operations engine
//!
//! This crate provides the building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed entity identifiers
//! - Stay periods and an injectable clock
//! - Port error taxonomy and optimistic-concurrency wrappers
//! - Domain events and the fire-and-forget notification sink

pub mod events;
pub mod identifiers;
pub mod money;
pub mod ports;
pub mod temporal;

pub use events::{DomainEvent, EventSink, NullEventSink};
pub use identifiers::{BillId, GuestId, OrderId, PaymentId, RoomId, TicketId};
pub use money::{Currency, Money, MoneyError};
pub use ports::{DomainPort, PortError, Versioned};
pub use temporal::{Clock, ManualClock, PeriodError, StayPeriod, SystemClock};
