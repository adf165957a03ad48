//! Record storage backends.
//!
//! Provides storage for groups (accounts) and people (contacts).
//!
//! # Backend Selection
//!
//! | Backend | Use |
//! |---------|-----|
//! | `SQLite` | Default. File-backed at the configured path or the platform data dir |
//! | Memory | Non-persistent; tests and dry runs |

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryRecordBackend;
pub use sqlite::SqliteRecordBackend;
pub use traits::RecordBackend;

use crate::config::StorageConfig;
use crate::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Backend type for record storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordBackendType {
    /// `SQLite` database (default, authoritative storage).
    #[default]
    Sqlite,
    /// In-memory maps, lost on exit.
    Memory,
}

impl RecordBackendType {
    /// Parses a backend name.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// assert_eq!(RecordBackendType::parse("SQLite"), Some(RecordBackendType::Sqlite));
    /// assert_eq!(RecordBackendType::parse("redis"), None);
    /// ```
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "memory" | "in-memory" | "inmemory" => Some(Self::Memory),
            _ => None,
        }
    }

    /// Returns the backend name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

/// Factory for creating record storage.
pub struct RecordStorageFactory;

impl RecordStorageFactory {
    /// Creates record storage from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No database path is configured and no platform data dir exists
    /// - Storage backend cannot be initialized
    pub fn create(config: &StorageConfig) -> Result<Arc<dyn RecordBackend>> {
        match config.backend {
            RecordBackendType::Memory => Ok(Self::create_in_memory()),
            RecordBackendType::Sqlite => {
                let path = config
                    .path
                    .clone()
                    .or_else(SqliteRecordBackend::default_path)
                    .ok_or_else(|| Error::OperationFailed {
                        operation: "create_record_storage".to_string(),
                        cause: "Could not determine database path".to_string(),
                    })?;
                Self::create_with_path(path)
            },
        }
    }

    /// Creates `SQLite` storage with an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn create_with_path(path: PathBuf) -> Result<Arc<dyn RecordBackend>> {
        tracing::debug!(path = %path.display(), "Opening record database");
        Ok(Arc::new(SqliteRecordBackend::new(path)?))
    }

    /// Creates an in-memory storage (useful for testing).
    #[must_use]
    pub fn create_in_memory() -> Arc<dyn RecordBackend> {
        Arc::new(InMemoryRecordBackend::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_record_backend_type_default() {
        assert_eq!(RecordBackendType::default(), RecordBackendType::Sqlite);
    }

    #[test_case("sqlite" => Some(RecordBackendType::Sqlite))]
    #[test_case(" SQLite " => Some(RecordBackendType::Sqlite))]
    #[test_case("memory" => Some(RecordBackendType::Memory))]
    #[test_case("in-memory" => Some(RecordBackendType::Memory))]
    #[test_case("redis" => None)]
    fn test_parse_backend_type(input: &str) -> Option<RecordBackendType> {
        RecordBackendType::parse(input)
    }

    #[test]
    fn test_create_in_memory() {
        let storage = RecordStorageFactory::create_in_memory();
        assert!(storage.list_groups().expect("list").is_empty());
    }

    #[test]
    fn test_create_with_path() {
        let dir = tempfile::TempDir::new().expect("failed to create temp dir");
        let db_path = dir.path().join("nested").join("records.db");

        let storage = RecordStorageFactory::create_with_path(db_path.clone());
        assert!(storage.is_ok());
        assert!(db_path.exists());
    }

    #[test]
    fn test_create_from_config() {
        let dir = tempfile::TempDir::new().expect("failed to create temp dir");
        let config = StorageConfig {
            backend: RecordBackendType::Sqlite,
            path: Some(dir.path().join("records.db")),
        };
        assert!(RecordStorageFactory::create(&config).is_ok());

        let config = StorageConfig {
            backend: RecordBackendType::Memory,
            path: None,
        };
        assert!(RecordStorageFactory::create(&config).is_ok());
    }
}
