//! Record maintenance service.
//!
//! Single-record and bulk DML operations over groups and people: insert,
//! update a field after a lookup, bulk insert, bulk delete.

use std::sync::Arc;

use tracing::instrument;

use crate::models::{Group, GroupId, Person, PersonId};
use crate::services::{AccountContactLinker, LinkOutcome};
use crate::storage::RecordBackend;
use crate::{Error, Result};

/// Service for record maintenance operations.
///
/// Uses a [`RecordBackend`] for persistence.
pub struct RecordService {
    backend: Arc<dyn RecordBackend>,
}

impl RecordService {
    /// Creates a new record service with the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn RecordBackend>) -> Self {
        Self { backend }
    }

    /// Creates one group.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is empty or whitespace
    /// - Storage cannot be accessed
    pub fn create_group(&self, name: &str) -> Result<Group> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Group name cannot be empty".to_string(),
            ));
        }

        let group = self
            .backend
            .create_groups(vec![Group::new(name)])?
            .pop()
            .ok_or_else(|| Error::OperationFailed {
                operation: "create_group".to_string(),
                cause: "backend returned no group".to_string(),
            })?;

        tracing::info!(
            group_id = ?group.id,
            group_name = %group.name,
            "Group created"
        );

        Ok(group)
    }

    /// Creates one unlinked person.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    pub fn add_person(&self, first_name: Option<&str>, group_key: Option<&str>) -> Result<Person> {
        let person = Person {
            first_name: first_name.map(ToString::to_string),
            group_key: group_key.map(ToString::to_string),
            ..Person::default()
        };

        self.add_people(vec![person])?
            .pop()
            .ok_or_else(|| Error::OperationFailed {
                operation: "add_person".to_string(),
                cause: "backend returned no person".to_string(),
            })
    }

    /// Inserts a batch of people in one write.
    ///
    /// # Errors
    ///
    /// Returns an error if any person already has an id or references an
    /// unknown group, or if storage cannot be accessed. Nothing is stored on
    /// error.
    #[instrument(skip(self, people), fields(operation = "add_people", count = people.len()))]
    pub fn add_people(&self, people: Vec<Person>) -> Result<Vec<Person>> {
        if people.is_empty() {
            return Ok(Vec::new());
        }
        let created = self.backend.create_people(people)?;
        tracing::info!(count = created.len(), "People added");
        Ok(created)
    }

    /// Gets a person by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    pub fn get_person(&self, person_id: &PersonId) -> Result<Option<Person>> {
        self.backend.get_person(person_id)
    }

    /// Changes a person's group key.
    ///
    /// When the key actually changes the person's group reference is cleared,
    /// so the next link run attaches it to the group matching the new key.
    /// Setting the same key again writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The person does not exist
    /// - Storage cannot be accessed
    pub fn set_group_key(&self, person_id: &PersonId, group_key: Option<&str>) -> Result<Person> {
        let mut person = self
            .backend
            .get_person(person_id)?
            .ok_or_else(|| Error::NotFound {
                kind: "person",
                id: person_id.to_string(),
            })?;

        if person.group_key.as_deref() == group_key {
            return Ok(person);
        }

        person.group_key = group_key.map(ToString::to_string);
        person.group_ref = None;
        self.backend.update_people(std::slice::from_ref(&person))?;

        tracing::info!(
            person_id = %person_id,
            group_key = ?person.group_key,
            "Person group key updated"
        );

        Ok(person)
    }

    /// Lists all groups, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    pub fn list_groups(&self) -> Result<Vec<Group>> {
        self.backend.list_groups()
    }

    /// Lists all people in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    pub fn list_people(&self) -> Result<Vec<Person>> {
        self.backend.list_people()
    }

    /// Deletes people by id. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    pub fn delete_people(&self, person_ids: &[PersonId]) -> Result<u64> {
        let deleted = self.backend.delete_people(person_ids)?;
        tracing::info!(requested = person_ids.len(), deleted, "People deleted");
        Ok(deleted)
    }

    /// Deletes a group. People linked to it become unlinked.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    pub fn delete_group(&self, group_id: &GroupId) -> Result<bool> {
        let deleted = self.backend.delete_group(group_id)?;
        if deleted {
            tracing::info!(group_id = %group_id, "Group deleted");
        }
        Ok(deleted)
    }

    /// Loads every stored person and links them to groups.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed or the link run fails.
    pub fn link_all(&self) -> Result<LinkOutcome> {
        let mut people = self.backend.list_people()?;
        AccountContactLinker::new(Arc::clone(&self.backend)).link_people_to_groups(&mut people)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRecordBackend;

    fn service() -> RecordService {
        RecordService::new(Arc::new(InMemoryRecordBackend::new()))
    }

    #[test]
    fn test_create_group() {
        let service = service();
        let group = service.create_group("Acme").expect("create group");
        assert!(group.is_persisted());
        assert_eq!(group.name, "Acme");
    }

    #[test]
    fn test_create_group_rejects_blank_name() {
        let service = service();
        assert!(matches!(
            service.create_group("   "),
            Err(Error::InvalidInput(_))
        ));
        assert!(service.list_groups().expect("list").is_empty());
    }

    #[test]
    fn test_add_person() {
        let service = service();
        let person = service
            .add_person(Some("Jane"), Some("Doe"))
            .expect("add person");

        assert!(person.id.is_some());
        assert_eq!(person.group_key.as_deref(), Some("Doe"));
        assert!(!person.is_linked());
    }

    #[test]
    fn test_add_no_people_is_a_no_op() {
        let service = service();
        assert!(service.add_people(Vec::new()).expect("add").is_empty());
    }

    #[test]
    fn test_set_group_key_clears_link() {
        let service = service();
        service.add_person(Some("Jane"), Some("Doe")).expect("add");
        service.link_all().expect("link");

        let person = service.list_people().expect("list").remove(0);
        let id = person.id.clone().expect("id");
        assert!(person.is_linked());

        let updated = service.set_group_key(&id, Some("Smith")).expect("set key");
        assert_eq!(updated.group_key.as_deref(), Some("Smith"));
        assert!(!updated.is_linked());

        let stored = service.get_person(&id).expect("get").expect("exists");
        assert_eq!(stored.group_key.as_deref(), Some("Smith"));
        assert!(stored.group_ref.is_none());
    }

    #[test]
    fn test_set_same_group_key_keeps_link() {
        let service = service();
        let person = service.add_person(None, Some("Doe")).expect("add");
        service.link_all().expect("link");
        let id = person.id.expect("id");

        let unchanged = service.set_group_key(&id, Some("Doe")).expect("set key");
        assert!(unchanged.is_linked());
    }

    #[test]
    fn test_set_group_key_on_missing_person() {
        let service = service();
        let result = service.set_group_key(&PersonId::new("ghost"), Some("Doe"));
        assert!(matches!(result, Err(Error::NotFound { kind: "person", .. })));
    }

    #[test]
    fn test_bulk_insert_then_delete() {
        let service = service();
        let people = service
            .add_people(vec![
                Person::new().with_group_key("Doe"),
                Person::new().with_group_key("Roe"),
            ])
            .expect("add people");
        let ids: Vec<PersonId> = people.into_iter().filter_map(|p| p.id).collect();

        assert_eq!(service.delete_people(&ids).expect("delete"), 2);
        assert!(service.list_people().expect("list").is_empty());
    }

    #[test]
    fn test_link_all_then_delete_group() {
        let service = service();
        service.add_person(None, Some("Doe")).expect("add");
        let outcome = service.link_all().expect("link");
        assert_eq!(outcome.groups_created, 1);

        let group = service.list_groups().expect("list").remove(0);
        assert!(service.delete_group(&group.id.expect("id")).expect("delete"));
        assert!(!service.list_people().expect("list")[0].is_linked());
    }
}
