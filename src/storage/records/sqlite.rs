//! `SQLite` backend for record storage.
//!
//! Stores groups and people in two tables linked by a foreign key. Every
//! batch write runs inside a transaction.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use tracing::instrument;

use crate::models::{Group, GroupId, Person, PersonId};
use crate::{Error, Result};

use super::traits::RecordBackend;

/// Upper bound on bound parameters per `IN (...)` lookup.
const NAME_CHUNK_SIZE: usize = 500;

/// SQLite-based record storage backend.
pub struct SqliteRecordBackend {
    /// Database connection (mutex for interior mutability).
    conn: Mutex<Connection>,
}

impl SqliteRecordBackend {
    /// Creates a new `SQLite` record backend at the specified path.
    ///
    /// Parent directories are created if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_record_dir".to_string(),
                cause: format!("{}: {e}", parent.display()),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| Error::OperationFailed {
            operation: "open_record_database".to_string(),
            cause: e.to_string(),
        })?;

        let backend = Self {
            conn: Mutex::new(conn),
        };
        backend.initialize_schema()?;
        Ok(backend)
    }

    /// Creates an in-memory `SQLite` record backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::OperationFailed {
            operation: "open_record_database_memory".to_string(),
            cause: e.to_string(),
        })?;

        let backend = Self {
            conn: Mutex::new(conn),
        };
        backend.initialize_schema()?;
        Ok(backend)
    }

    /// Returns the default database path.
    ///
    /// The path is `{data_dir}/contact-linker/records.db`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|d| {
            d.data_local_dir()
                .join("contact-linker")
                .join("records.db")
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| Error::OperationFailed {
            operation: "lock_connection".to_string(),
            cause: e.to_string(),
        })
    }

    /// Initializes the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            PRAGMA foreign_keys = ON;

            -- Group names are intentionally not unique
            CREATE TABLE IF NOT EXISTS groups (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_groups_name ON groups(name);

            CREATE TABLE IF NOT EXISTS people (
                id TEXT PRIMARY KEY,
                first_name TEXT,
                group_key TEXT,
                group_id TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (group_id) REFERENCES groups(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_people_group ON people(group_id);
            ",
        )
        .map_err(|e| Error::OperationFailed {
            operation: "initialize_record_schema".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }

    /// Gets the current Unix timestamp as i64 (for `SQLite` compatibility).
    #[allow(clippy::cast_possible_wrap)]
    fn now() -> i64 {
        crate::current_timestamp() as i64
    }

    /// Converts i64 from `SQLite` back to u64 timestamp.
    #[allow(clippy::cast_sign_loss)]
    const fn from_db_timestamp(ts: i64) -> u64 {
        ts as u64
    }

    fn group_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Group> {
        Ok(Group {
            id: Some(GroupId::new(row.get::<_, String>(0)?)),
            name: row.get(1)?,
            created_at: Self::from_db_timestamp(row.get(2)?),
        })
    }

    fn person_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Person> {
        Ok(Person {
            id: Some(PersonId::new(row.get::<_, String>(0)?)),
            first_name: row.get(1)?,
            group_key: row.get(2)?,
            group_ref: row.get::<_, Option<String>>(3)?.map(GroupId::new),
            created_at: Self::from_db_timestamp(row.get(4)?),
            updated_at: Self::from_db_timestamp(row.get(5)?),
        })
    }

    /// Maps a write error, surfacing foreign key violations as invalid input.
    fn write_error(operation: &str, e: &rusqlite::Error) -> Error {
        if e.to_string().contains("FOREIGN KEY constraint failed") {
            Error::InvalidInput("person references a group that does not exist".to_string())
        } else {
            Error::OperationFailed {
                operation: operation.to_string(),
                cause: e.to_string(),
            }
        }
    }
}

impl RecordBackend for SqliteRecordBackend {
    #[instrument(skip(self, names), fields(names = names.len()))]
    fn query_groups_by_name(&self, names: &BTreeSet<String>) -> Result<Vec<Group>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let names: Vec<&String> = names.iter().collect();
        let mut groups = Vec::new();

        for chunk in names.chunks(NAME_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT id, name, created_at FROM groups
                 WHERE name IN ({placeholders}) ORDER BY created_at, rowid"
            );

            let mut stmt = conn.prepare(&sql).map_err(|e| Error::OperationFailed {
                operation: "prepare_query_groups_by_name".to_string(),
                cause: e.to_string(),
            })?;

            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), Self::group_from_row)
                .map_err(|e| Error::OperationFailed {
                    operation: "query_groups_by_name".to_string(),
                    cause: e.to_string(),
                })?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::OperationFailed {
                    operation: "collect_groups".to_string(),
                    cause: e.to_string(),
                })?;

            groups.extend(rows);
        }

        Ok(groups)
    }

    #[instrument(skip(self, groups), fields(count = groups.len()))]
    fn create_groups(&self, groups: Vec<Group>) -> Result<Vec<Group>> {
        if let Some(group) = groups.iter().find(|g| g.is_persisted()) {
            return Err(Error::InvalidInput(format!(
                "group '{}' is already persisted",
                group.name
            )));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| Error::OperationFailed {
            operation: "begin_create_groups".to_string(),
            cause: e.to_string(),
        })?;

        let now = Self::now();
        let mut created = Vec::with_capacity(groups.len());
        for mut group in groups {
            let id = GroupId::generate();
            tx.execute(
                "INSERT INTO groups (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![id.as_str(), group.name, now],
            )
            .map_err(|e| Self::write_error("create_groups", &e))?;

            group.id = Some(id);
            group.created_at = Self::from_db_timestamp(now);
            created.push(group);
        }

        tx.commit().map_err(|e| Error::OperationFailed {
            operation: "commit_create_groups".to_string(),
            cause: e.to_string(),
        })?;

        Ok(created)
    }

    fn list_groups(&self) -> Result<Vec<Group>> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare("SELECT id, name, created_at FROM groups ORDER BY name, rowid")
            .map_err(|e| Error::OperationFailed {
                operation: "prepare_list_groups".to_string(),
                cause: e.to_string(),
            })?;

        let groups = stmt
            .query_map([], Self::group_from_row)
            .map_err(|e| Error::OperationFailed {
                operation: "list_groups".to_string(),
                cause: e.to_string(),
            })?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::OperationFailed {
                operation: "collect_groups".to_string(),
                cause: e.to_string(),
            })?;

        Ok(groups)
    }

    fn delete_group(&self, group_id: &GroupId) -> Result<bool> {
        let conn = self.lock()?;

        let rows = conn
            .execute("DELETE FROM groups WHERE id = ?1", params![group_id.as_str()])
            .map_err(|e| Error::OperationFailed {
                operation: "delete_group".to_string(),
                cause: e.to_string(),
            })?;

        Ok(rows > 0)
    }

    #[instrument(skip(self, people), fields(count = people.len()))]
    fn create_people(&self, people: Vec<Person>) -> Result<Vec<Person>> {
        if people.iter().any(|p| p.id.is_some()) {
            return Err(Error::InvalidInput(
                "cannot create a person that already has an id".to_string(),
            ));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| Error::OperationFailed {
            operation: "begin_create_people".to_string(),
            cause: e.to_string(),
        })?;

        let now = Self::now();
        let mut created = Vec::with_capacity(people.len());
        for mut person in people {
            let id = PersonId::generate();
            tx.execute(
                "INSERT INTO people (id, first_name, group_key, group_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id.as_str(),
                    person.first_name,
                    person.group_key,
                    person.group_ref.as_ref().map(GroupId::as_str),
                    now,
                    now,
                ],
            )
            .map_err(|e| Self::write_error("create_people", &e))?;

            person.id = Some(id);
            person.created_at = Self::from_db_timestamp(now);
            person.updated_at = Self::from_db_timestamp(now);
            created.push(person);
        }

        tx.commit().map_err(|e| Error::OperationFailed {
            operation: "commit_create_people".to_string(),
            cause: e.to_string(),
        })?;

        Ok(created)
    }

    #[instrument(skip(self, people), fields(count = people.len()))]
    fn update_people(&self, people: &[Person]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| Error::OperationFailed {
            operation: "begin_update_people".to_string(),
            cause: e.to_string(),
        })?;

        let now = Self::now();
        for person in people {
            let id = person.id.as_ref().ok_or_else(|| {
                Error::InvalidInput("cannot update a person without an id".to_string())
            })?;

            let rows = tx
                .execute(
                    "UPDATE people SET first_name = ?1, group_key = ?2, group_id = ?3,
                         updated_at = ?4
                     WHERE id = ?5",
                    params![
                        person.first_name,
                        person.group_key,
                        person.group_ref.as_ref().map(GroupId::as_str),
                        now,
                        id.as_str(),
                    ],
                )
                .map_err(|e| Self::write_error("update_people", &e))?;

            if rows == 0 {
                return Err(Error::NotFound {
                    kind: "person",
                    id: id.to_string(),
                });
            }
        }

        tx.commit().map_err(|e| Error::OperationFailed {
            operation: "commit_update_people".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }

    fn get_person(&self, person_id: &PersonId) -> Result<Option<Person>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                "SELECT id, first_name, group_key, group_id, created_at, updated_at
                 FROM people WHERE id = ?1",
                params![person_id.as_str()],
                Self::person_from_row,
            )
            .optional()
            .map_err(|e| Error::OperationFailed {
                operation: "get_person".to_string(),
                cause: e.to_string(),
            })?;

        Ok(result)
    }

    fn list_people(&self) -> Result<Vec<Person>> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, first_name, group_key, group_id, created_at, updated_at
                 FROM people ORDER BY rowid",
            )
            .map_err(|e| Error::OperationFailed {
                operation: "prepare_list_people".to_string(),
                cause: e.to_string(),
            })?;

        let people = stmt
            .query_map([], Self::person_from_row)
            .map_err(|e| Error::OperationFailed {
                operation: "list_people".to_string(),
                cause: e.to_string(),
            })?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::OperationFailed {
                operation: "collect_people".to_string(),
                cause: e.to_string(),
            })?;

        Ok(people)
    }

    fn delete_people(&self, person_ids: &[PersonId]) -> Result<u64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| Error::OperationFailed {
            operation: "begin_delete_people".to_string(),
            cause: e.to_string(),
        })?;

        let mut deleted = 0u64;
        for id in person_ids {
            let rows = tx
                .execute("DELETE FROM people WHERE id = ?1", params![id.as_str()])
                .map_err(|e| Error::OperationFailed {
                    operation: "delete_people".to_string(),
                    cause: e.to_string(),
                })?;
            deleted += rows as u64;
        }

        tx.commit().map_err(|e| Error::OperationFailed {
            operation: "commit_delete_people".to_string(),
            cause: e.to_string(),
        })?;

        Ok(deleted)
    }
}
