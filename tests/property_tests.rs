//! Property-based tests for the linker.
//!
//! Uses proptest to verify invariants across random batches:
//! - Every keyed person ends up linked to a group named after its key
//! - Groups created equals the number of distinct keys not already stored
//! - A second run writes nothing

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use contact_linker::models::{Group, Person};
use contact_linker::services::AccountContactLinker;
use contact_linker::storage::{InMemoryRecordBackend, RecordBackend};
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(vec!["", "Doe", "Roe", "Smith", "Jones", "Lee"]))
        .prop_map(|k| k.map(ToString::to_string))
}

proptest! {
    /// Property: keyed people are linked to the group matching their key.
    #[test]
    fn prop_keyed_people_link_to_matching_group(
        keys in prop::collection::vec(key_strategy(), 0..30),
        stored in prop::collection::btree_set(prop::sample::select(vec!["Doe", "Smith"]), 0..3),
    ) {
        let backend = Arc::new(InMemoryRecordBackend::new());
        if !stored.is_empty() {
            backend
                .create_groups(stored.iter().map(|n| Group::new(*n)).collect())
                .expect("seed groups");
        }

        let mut people = backend
            .create_people(
                keys.iter()
                    .map(|k| Person { group_key: k.clone(), ..Person::default() })
                    .collect(),
            )
            .expect("create people");

        let outcome = AccountContactLinker::new(backend.clone())
            .link_people_to_groups(&mut people)
            .expect("link");

        let distinct: BTreeSet<&str> = keys.iter().flatten().map(String::as_str).collect();
        let expected_created = distinct.iter().filter(|k| !stored.contains(**k)).count();
        prop_assert_eq!(outcome.groups_created, expected_created);

        let names: HashMap<_, _> = backend
            .list_groups()
            .expect("list groups")
            .into_iter()
            .map(|g| (g.id.expect("id"), g.name))
            .collect();

        for person in &people {
            match (&person.group_key, &person.group_ref) {
                (Some(key), Some(group)) => {
                    prop_assert_eq!(names.get(group), Some(key));
                },
                (None, None) => {},
                other => {
                    prop_assert!(false, "unexpected state {:?}", other);
                },
            }
        }
    }

    /// Property: a second run over the same batch writes nothing.
    #[test]
    fn prop_second_run_is_write_free(keys in prop::collection::vec(key_strategy(), 0..30)) {
        let backend = Arc::new(InMemoryRecordBackend::new());
        let mut people = backend
            .create_people(
                keys.iter()
                    .map(|k| Person { group_key: k.clone(), ..Person::default() })
                    .collect(),
            )
            .expect("create people");
        let linker = AccountContactLinker::new(backend.clone());

        linker.link_people_to_groups(&mut people).expect("first run");
        let groups = backend.group_writes();
        let writes = backend.person_writes();
        let snapshot = people.clone();

        let outcome = linker.link_people_to_groups(&mut people).expect("second run");

        prop_assert_eq!(outcome.groups_created, 0);
        prop_assert!(!outcome.people_written);
        prop_assert_eq!(backend.group_writes(), groups);
        prop_assert_eq!(backend.person_writes(), writes);
        prop_assert_eq!(people, snapshot);
    }
}
