//! Store adapters
//!
//! [`MemoryStore`] is the single in-process adapter behind every domain
//! port: bills, rooms and guests live in versioned maps guarded by async
//! locks, and `update` enforces the same version precondition a document
//! store would. One instance per tenant; nothing here is shared across
//! properties.

pub mod memory;

pub use memory::MemoryStore;
