//! # Contact Linker
//!
//! Idempotent account/contact linking over a pluggable record store.
//!
//! People (contacts) carry a group key, their last name. The linker makes
//! sure every keyed, unlinked person ends up attached to a group (account)
//! named after that key, creating each missing group once per batch and
//! reusing groups that already exist.
//!
//! ## Features
//!
//! - Batch upsert-and-link with at most one query, one create and one update
//! - Pluggable record store behind [`RecordBackend`] (`SQLite`, in-memory)
//! - Single-record DML helpers in [`RecordService`]
//! - Structured logging through `tracing`
//!
//! ## Example
//!
//! ```rust,ignore
//! use contact_linker::{AccountContactLinker, Person, RecordBackend, RecordStorageFactory};
//!
//! let backend = RecordStorageFactory::create_in_memory();
//! let linker = AccountContactLinker::new(backend.clone());
//!
//! let mut people = backend.create_people(vec![
//!     Person::new().with_group_key("Doe"),
//!     Person::new().with_group_key("Doe"),
//! ])?;
//! let outcome = linker.link_people_to_groups(&mut people)?;
//! assert_eq!(outcome.groups_created, 1);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::{LinkerConfig, LoggingSettings, StorageConfig};
pub use models::{Group, GroupId, Person, PersonId};
pub use services::{AccountContactLinker, LinkOutcome, RecordService};
pub use storage::{
    InMemoryRecordBackend, RecordBackend, RecordBackendType, RecordStorageFactory,
    SqliteRecordBackend,
};

/// Error type for contact-linker operations.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Empty group names, updating unsaved people, dangling group references |
/// | `NotFound` | A person or group id the store does not hold |
/// | `OperationFailed` | Database, I/O, config parsing or logging setup failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A group name is empty in `RecordService::create_group`
    /// - A person without an id is passed to an update
    /// - A person references a group the store does not hold
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A record was not found.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// The record kind ("person" or "group").
        kind: &'static str,
        /// The missing identifier.
        id: String,
    },

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` database operations fail
    /// - A backend lock is poisoned
    /// - Config files cannot be read or parsed
    /// - Logging cannot be initialized
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for contact-linker operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::OperationFailed {
            operation: "test".to_string(),
            cause: "failed".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'test' failed: failed");

        let err = Error::NotFound {
            kind: "person",
            id: "abc123".to_string(),
        };
        assert_eq!(err.to_string(), "person 'abc123' not found");
    }

    #[test]
    fn test_current_timestamp_is_after_epoch() {
        assert!(current_timestamp() > 0);
    }
}
