//! In-memory record backend for testing.
//!
//! Provides a fast, non-persistent implementation of [`RecordBackend`] that
//! also counts calls, so tests can assert how many queries and writes an
//! operation issued.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::{Group, GroupId, Person, PersonId};
use crate::{Error, Result};

use super::traits::RecordBackend;

#[derive(Debug, Default)]
struct Records {
    groups: Vec<Group>,
    people: Vec<Person>,
}

impl Records {
    fn has_group(&self, id: &GroupId) -> bool {
        self.groups.iter().any(|g| g.id.as_ref() == Some(id))
    }

    fn check_group_ref(&self, person: &Person) -> Result<()> {
        match &person.group_ref {
            Some(id) if !self.has_group(id) => Err(Error::InvalidInput(format!(
                "person references unknown group '{id}'"
            ))),
            _ => Ok(()),
        }
    }
}

/// In-memory record backend.
///
/// Uses `RwLock` for thread-safe access. Batch writes validate the whole
/// batch before applying any of it.
#[derive(Debug, Default)]
pub struct InMemoryRecordBackend {
    records: RwLock<Records>,
    query_calls: AtomicUsize,
    group_writes: AtomicUsize,
    person_writes: AtomicUsize,
}

impl InMemoryRecordBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `query_groups_by_name` calls served.
    #[must_use]
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Number of group batch writes (`create_groups`) attempted.
    #[must_use]
    pub fn group_writes(&self) -> usize {
        self.group_writes.load(Ordering::SeqCst)
    }

    /// Number of person batch writes (`create_people`, `update_people`) attempted.
    #[must_use]
    pub fn person_writes(&self) -> usize {
        self.person_writes.load(Ordering::SeqCst)
    }

    /// Number of stored groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.records.read().map(|r| r.groups.len()).unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Records>> {
        self.records.read().map_err(|e| Error::OperationFailed {
            operation: "read_records".to_string(),
            cause: e.to_string(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Records>> {
        self.records.write().map_err(|e| Error::OperationFailed {
            operation: "write_records".to_string(),
            cause: e.to_string(),
        })
    }
}

impl RecordBackend for InMemoryRecordBackend {
    fn query_groups_by_name(&self, names: &BTreeSet<String>) -> Result<Vec<Group>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        let records = self.read()?;
        Ok(records
            .groups
            .iter()
            .filter(|g| names.contains(&g.name))
            .cloned()
            .collect())
    }

    fn create_groups(&self, groups: Vec<Group>) -> Result<Vec<Group>> {
        self.group_writes.fetch_add(1, Ordering::SeqCst);
        if let Some(group) = groups.iter().find(|g| g.is_persisted()) {
            return Err(Error::InvalidInput(format!(
                "group '{}' is already persisted",
                group.name
            )));
        }

        let now = crate::current_timestamp();
        let created: Vec<Group> = groups
            .into_iter()
            .map(|mut g| {
                g.id = Some(GroupId::generate());
                g.created_at = now;
                g
            })
            .collect();

        self.write()?.groups.extend(created.iter().cloned());
        Ok(created)
    }

    fn list_groups(&self) -> Result<Vec<Group>> {
        let mut groups = self.read()?.groups.clone();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    fn delete_group(&self, group_id: &GroupId) -> Result<bool> {
        let mut records = self.write()?;
        let before = records.groups.len();
        records.groups.retain(|g| g.id.as_ref() != Some(group_id));
        if records.groups.len() == before {
            return Ok(false);
        }

        for person in &mut records.people {
            if person.group_ref.as_ref() == Some(group_id) {
                person.group_ref = None;
            }
        }
        Ok(true)
    }

    fn create_people(&self, people: Vec<Person>) -> Result<Vec<Person>> {
        self.person_writes.fetch_add(1, Ordering::SeqCst);
        let mut records = self.write()?;

        for person in &people {
            if person.id.is_some() {
                return Err(Error::InvalidInput(
                    "cannot create a person that already has an id".to_string(),
                ));
            }
            records.check_group_ref(person)?;
        }

        let now = crate::current_timestamp();
        let created: Vec<Person> = people
            .into_iter()
            .map(|mut p| {
                p.id = Some(PersonId::generate());
                p.created_at = now;
                p.updated_at = now;
                p
            })
            .collect();

        records.people.extend(created.iter().cloned());
        Ok(created)
    }

    fn update_people(&self, people: &[Person]) -> Result<()> {
        self.person_writes.fetch_add(1, Ordering::SeqCst);
        let mut records = self.write()?;

        let mut positions = Vec::with_capacity(people.len());
        for person in people {
            let id = person.id.as_ref().ok_or_else(|| {
                Error::InvalidInput("cannot update a person without an id".to_string())
            })?;
            let position = records
                .people
                .iter()
                .position(|p| p.id.as_ref() == Some(id))
                .ok_or_else(|| Error::NotFound {
                    kind: "person",
                    id: id.to_string(),
                })?;
            records.check_group_ref(person)?;
            positions.push(position);
        }

        let now = crate::current_timestamp();
        for (person, position) in people.iter().zip(positions) {
            let stored = &mut records.people[position];
            stored.first_name.clone_from(&person.first_name);
            stored.group_key.clone_from(&person.group_key);
            stored.group_ref.clone_from(&person.group_ref);
            stored.updated_at = now;
        }
        Ok(())
    }

    fn get_person(&self, person_id: &PersonId) -> Result<Option<Person>> {
        Ok(self
            .read()?
            .people
            .iter()
            .find(|p| p.id.as_ref() == Some(person_id))
            .cloned())
    }

    fn list_people(&self) -> Result<Vec<Person>> {
        Ok(self.read()?.people.clone())
    }

    fn delete_people(&self, person_ids: &[PersonId]) -> Result<u64> {
        let doomed: HashSet<&PersonId> = person_ids.iter().collect();
        let mut records = self.write()?;
        let before = records.people.len();
        records
            .people
            .retain(|p| p.id.as_ref().is_none_or(|id| !doomed.contains(id)));
        Ok((before - records.people.len()) as u64)
    }
}
