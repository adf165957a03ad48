//! Integration tests for the account/contact linker.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use contact_linker::models::{Group, GroupId, Person, PersonId};
use contact_linker::services::{AccountContactLinker, RecordService};
use contact_linker::storage::{InMemoryRecordBackend, RecordBackend};
use contact_linker::{Error, Result};

/// Which backend call should fail.
#[derive(Clone, Copy, PartialEq, Eq)]
enum FailAt {
    Query,
    Create,
    Update,
}

/// Wraps the in-memory backend and fails one kind of call.
struct FaultyBackend {
    inner: InMemoryRecordBackend,
    fail_at: FailAt,
    update_calls: AtomicUsize,
}

impl FaultyBackend {
    fn new(fail_at: FailAt) -> Self {
        Self {
            inner: InMemoryRecordBackend::new(),
            fail_at,
            update_calls: AtomicUsize::new(0),
        }
    }

    fn failure(operation: &str) -> Error {
        Error::OperationFailed {
            operation: operation.to_string(),
            cause: "connection reset".to_string(),
        }
    }
}

impl RecordBackend for FaultyBackend {
    fn query_groups_by_name(&self, names: &BTreeSet<String>) -> Result<Vec<Group>> {
        if self.fail_at == FailAt::Query {
            return Err(Self::failure("query_groups_by_name"));
        }
        self.inner.query_groups_by_name(names)
    }

    fn create_groups(&self, groups: Vec<Group>) -> Result<Vec<Group>> {
        if self.fail_at == FailAt::Create {
            return Err(Self::failure("create_groups"));
        }
        self.inner.create_groups(groups)
    }

    fn list_groups(&self) -> Result<Vec<Group>> {
        self.inner.list_groups()
    }

    fn delete_group(&self, group_id: &GroupId) -> Result<bool> {
        self.inner.delete_group(group_id)
    }

    fn create_people(&self, people: Vec<Person>) -> Result<Vec<Person>> {
        self.inner.create_people(people)
    }

    fn update_people(&self, people: &[Person]) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == FailAt::Update {
            return Err(Self::failure("update_people"));
        }
        self.inner.update_people(people)
    }

    fn get_person(&self, person_id: &PersonId) -> Result<Option<Person>> {
        self.inner.get_person(person_id)
    }

    fn list_people(&self) -> Result<Vec<Person>> {
        self.inner.list_people()
    }

    fn delete_people(&self, person_ids: &[PersonId]) -> Result<u64> {
        self.inner.delete_people(person_ids)
    }
}

fn keyed(keys: &[Option<&str>]) -> Vec<Person> {
    keys.iter()
        .map(|key| Person {
            group_key: key.map(ToString::to_string),
            ..Person::default()
        })
        .collect()
}

#[test]
fn test_doe_doe_jane_creates_two_groups() {
    let backend = Arc::new(InMemoryRecordBackend::new());
    let mut people = backend
        .create_people(keyed(&[Some("Doe"), Some("Doe"), Some("Jane")]))
        .expect("create people");
    let linker = AccountContactLinker::new(backend.clone());

    let outcome = linker.link_people_to_groups(&mut people).expect("link");

    assert_eq!(outcome.groups_created, 2);
    let groups = backend.list_groups().expect("list groups");
    let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Doe", "Jane"]);

    let doe_id = groups[0].id.clone();
    assert_eq!(people[0].group_ref, doe_id);
    assert_eq!(people[1].group_ref, doe_id);
    assert_eq!(people[2].group_ref, groups[1].id);

    let stored = backend.list_people().expect("list people");
    assert_eq!(stored[0].group_ref, doe_id);
    assert_eq!(stored[1].group_ref, doe_id);
}

#[test]
fn test_idempotent_over_stored_batch() {
    let backend = Arc::new(InMemoryRecordBackend::new());
    let service = RecordService::new(backend.clone());
    service
        .add_people(keyed(&[Some("Doe"), None, Some("Roe"), Some("")]))
        .expect("add people");

    let first = service.link_all().expect("first link");
    assert_eq!(first.groups_created, 3);
    assert_eq!(first.people_linked(), 3);
    assert_eq!(first.skipped_without_key, 1);

    let group_writes = backend.group_writes();
    let person_writes = backend.person_writes();

    let second = service.link_all().expect("second link");
    assert_eq!(second.groups_created, 0);
    assert_eq!(second.people_linked(), 0);
    assert_eq!(second.skipped_already_linked, 3);
    assert!(!second.people_written);
    assert_eq!(backend.group_writes(), group_writes);
    assert_eq!(backend.person_writes(), person_writes);
    assert_eq!(backend.group_count(), 3);
}

#[test]
fn test_mixed_batch_reuses_and_creates() {
    let backend = Arc::new(InMemoryRecordBackend::new());
    let smith = backend
        .create_groups(vec![Group::new("Smith")])
        .expect("create group")
        .remove(0);
    let mut people = backend
        .create_people(keyed(&[Some("Smith"), Some("Jones"), None]))
        .expect("create people");

    let outcome = AccountContactLinker::new(backend.clone())
        .link_people_to_groups(&mut people)
        .expect("link");

    assert_eq!(outcome.linked_to_existing, 1);
    assert_eq!(outcome.linked_to_new, 1);
    assert_eq!(outcome.groups_created, 1);
    assert_eq!(people[0].group_ref, smith.id);
    assert!(people[1].is_linked());
    assert!(!people[2].is_linked());
    assert_eq!(backend.query_calls(), 1);
}

#[test]
fn test_create_failure_performs_no_person_update() {
    let backend = Arc::new(FaultyBackend::new(FailAt::Create));
    let mut people = backend
        .create_people(keyed(&[Some("Doe")]))
        .expect("create people");
    let before = people.clone();

    let result = AccountContactLinker::new(backend.clone()).link_people_to_groups(&mut people);

    match result {
        Err(Error::OperationFailed { operation, .. }) => assert_eq!(operation, "create_groups"),
        other => panic!("expected create failure, got {other:?}"),
    }
    assert_eq!(backend.update_calls.load(Ordering::SeqCst), 0);
    assert_eq!(people, before);
    assert!(!backend.list_people().expect("list")[0].is_linked());
}

#[test]
fn test_query_failure_propagates() {
    let backend = Arc::new(FaultyBackend::new(FailAt::Query));
    let mut people = backend
        .create_people(keyed(&[Some("Doe")]))
        .expect("create people");

    let result = AccountContactLinker::new(backend.clone()).link_people_to_groups(&mut people);

    assert!(matches!(result, Err(Error::OperationFailed { .. })));
    assert!(backend.list_groups().expect("list").is_empty());
    assert_eq!(backend.update_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_update_failure_leaves_caller_batch_unchanged() {
    let backend = Arc::new(FaultyBackend::new(FailAt::Update));
    let mut people = backend
        .create_people(keyed(&[Some("Doe")]))
        .expect("create people");

    let result = AccountContactLinker::new(backend.clone()).link_people_to_groups(&mut people);

    assert!(matches!(result, Err(Error::OperationFailed { .. })));
    assert!(!people[0].is_linked());
    assert_eq!(backend.update_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_pre_linked_person_with_mismatched_key_is_kept() {
    let backend = Arc::new(InMemoryRecordBackend::new());
    let acme = backend
        .create_groups(vec![Group::new("Acme")])
        .expect("create group")
        .remove(0);
    let acme_id = acme.id.expect("id");
    let mut people = backend
        .create_people(vec![
            Person::new().with_group_key("Doe").with_group_ref(acme_id.clone()),
            Person::new().with_group_key("Doe"),
        ])
        .expect("create people");

    let outcome = AccountContactLinker::new(backend.clone())
        .link_people_to_groups(&mut people)
        .expect("link");

    assert_eq!(outcome.skipped_already_linked, 1);
    assert_eq!(outcome.linked_to_new, 1);
    assert_eq!(people[0].group_ref, Some(acme_id));
    assert_ne!(people[1].group_ref, people[0].group_ref);
}
