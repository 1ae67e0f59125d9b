//! Stay Domain - the lifecycle of a guest's stay
//!
//! The [`StayController`] orchestrates the cross-entity steps of check-in,
//! checkout and extension as explicit, individually idempotent writes:
//! there is no cross-entity transaction, so the ordering is chosen for
//! crash recoverability (bill finalized before the guest flips, guest
//! before the room). The [`CheckoutGuard`] enforces the
//! zero-balance-before-checkout invariant, and the charge calculator is a
//! pure policy function behind the [`ChargeCalculator`] seam.

pub mod charges;
pub mod controller;
pub mod error;
pub mod guard;
pub mod guest;
pub mod policy;
pub mod ports;

pub use charges::{CalculationError, ChargeCalculator, ChargeSheet, ChargeSummary, PolicyCalculator};
pub use controller::{NewGuest, StayController, StaySnapshot};
pub use error::StayError;
pub use guard::{CheckoutClearance, CheckoutGuard};
pub use guest::{Guest, GuestStatus, IdDocument};
pub use policy::HotelPolicy;
pub use ports::GuestStore;
