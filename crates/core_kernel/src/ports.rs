//! Ports infrastructure
//!
//! Each domain defines its own async port trait for the persistent store it
//! needs (guests, rooms, bills); adapters implement those traits. The store
//! is treated as opaque: create/get/find plus an update that carries a
//! version precondition. No cross-entity transactions exist, so every
//! multi-entity flow is a sequence of idempotent single-document writes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for port operations
///
/// A unified error type that all port implementations use, so domain code
/// handles store failures the same way regardless of the adapter behind it.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// A field constraint was violated (type, enum, required-ness)
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The write conflicts with the document's current version or with a
    /// uniqueness constraint
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Connection to the underlying store failed
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// An internal adapter error occurred
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error signals a lost optimistic-concurrency race
    /// that the caller should resolve by re-reading and retrying
    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker trait for all domain ports
///
/// All port traits extend this marker to ensure they are thread-safe and
/// usable from async contexts.
pub trait DomainPort: Send + Sync + 'static {}

/// A document snapshot paired with its store version
///
/// Mutations on a single entity serialize through read-modify-write: the
/// caller reads a `Versioned<T>`, mutates the data, and writes it back with
/// the version as a precondition. A concurrent writer that got there first
/// bumps the version and the late write fails with [`PortError::Conflict`]
/// instead of silently losing the earlier update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub data: T,
    pub version: u64,
}

impl<T> Versioned<T> {
    pub fn new(data: T, version: u64) -> Self {
        Self { data, version }
    }

    /// Maps the inner document, preserving the version
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Versioned<U> {
        Versioned {
            data: f(self.data),
            version: self.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        let error = PortError::not_found("Room", "ROOM-123");
        assert!(error.is_not_found());
        assert!(!error.is_conflict());
        assert!(error.to_string().contains("Room"));
    }

    #[test]
    fn conflict_classification() {
        let error = PortError::conflict("version 3 expected, store has 4");
        assert!(error.is_conflict());
        assert!(!error.is_not_found());
    }

    #[test]
    fn versioned_map_preserves_version() {
        let v = Versioned::new(41, 7).map(|n| n + 1);
        assert_eq!(v.data, 42);
        assert_eq!(v.version, 7);
    }
}
