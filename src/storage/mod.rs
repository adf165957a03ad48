//! Storage layer abstraction.
//!
//! The record store is the system of record for groups and people. Business
//! logic only reaches it through [`RecordBackend`].

// Allow significant_drop_tightening - dropping database connections slightly early
// provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]
// Allow cast_possible_truncation for row counts reported as u64.
#![allow(clippy::cast_possible_truncation)]

pub mod records;

pub use records::{
    InMemoryRecordBackend, RecordBackend, RecordBackendType, RecordStorageFactory,
    SqliteRecordBackend,
};
