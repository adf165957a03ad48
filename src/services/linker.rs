//! Account/contact linking service.
//!
//! Attaches every keyed, unlinked person to the group named after its key,
//! creating missing groups once per batch.
//!
//! # Round trips
//!
//! A run issues at most one group lookup, one group batch create and one
//! person batch update, and skips each of them when it has nothing to do.
//! Running the linker again over an already linked batch therefore writes
//! nothing.
//!
//! # Failure
//!
//! Any backend error aborts the run and is returned unchanged. The caller's
//! batch is only modified after the final update has succeeded.
//!
//! # Example
//!
//! ```rust,ignore
//! use contact_linker::services::AccountContactLinker;
//! use contact_linker::storage::RecordStorageFactory;
//!
//! let backend = RecordStorageFactory::create_in_memory();
//! let linker = AccountContactLinker::new(backend.clone());
//! let mut people = backend.list_people()?;
//! let outcome = linker.link_people_to_groups(&mut people)?;
//! println!("created {} groups", outcome.groups_created);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::models::{Group, GroupId, Person};
use crate::storage::RecordBackend;
use crate::{Error, Result};

/// Summary of one linking run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkOutcome {
    /// Groups created by this run.
    pub groups_created: usize,
    /// People attached to a group that already existed.
    pub linked_to_existing: usize,
    /// People attached to a group created by this run.
    pub linked_to_new: usize,
    /// People left alone because they have no key.
    pub skipped_without_key: usize,
    /// People left alone because they already reference a group.
    pub skipped_already_linked: usize,
    /// Whether the person batch was written back.
    pub people_written: bool,
}

impl LinkOutcome {
    /// Total number of people linked by this run.
    #[must_use]
    pub const fn people_linked(&self) -> usize {
        self.linked_to_existing + self.linked_to_new
    }
}

/// Links people to groups named after their group key.
pub struct AccountContactLinker {
    backend: Arc<dyn RecordBackend>,
}

impl AccountContactLinker {
    /// Creates a new linker over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn RecordBackend>) -> Self {
        Self { backend }
    }

    /// Links every keyed, unlinked person in `people` to a persisted group
    /// whose name equals its key.
    ///
    /// People without a key, or already referencing a group, are left as
    /// they are. An empty-string key is a key. All people in the batch must
    /// already be persisted, since the whole batch is written back whenever
    /// at least one person was linked.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the lookup, the group create or the
    /// person update fails. `people` is unchanged in that case.
    #[instrument(
        skip(self, people),
        fields(operation = "link_people_to_groups", people = people.len())
    )]
    pub fn link_people_to_groups(&self, people: &mut [Person]) -> Result<LinkOutcome> {
        metrics::counter!("linker_runs_total").increment(1);

        let mut outcome = LinkOutcome::default();
        for person in people.iter() {
            if person.group_key.is_none() {
                outcome.skipped_without_key += 1;
            } else if person.is_linked() {
                outcome.skipped_already_linked += 1;
            }
        }

        let keys: BTreeSet<String> = people
            .iter()
            .filter(|p| p.needs_link())
            .filter_map(|p| p.group_key.clone())
            .collect();

        if keys.is_empty() {
            tracing::debug!(
                skipped_without_key = outcome.skipped_without_key,
                skipped_already_linked = outcome.skipped_already_linked,
                "Nothing to link"
            );
            return Ok(outcome);
        }

        let mut by_name = self.existing_groups(&keys)?;

        let missing: Vec<Group> = keys
            .iter()
            .filter(|key| !by_name.contains_key(*key))
            .map(|key| {
                tracing::debug!(group_name = %key, "Staging new group");
                Group::new(key.clone())
            })
            .collect();

        let mut created_names = BTreeSet::new();
        if !missing.is_empty() {
            let created = self.backend.create_groups(missing).inspect_err(|e| {
                metrics::counter!("linker_failures_total", "stage" => "create").increment(1);
                tracing::warn!(error = %e, "Group create failed");
            })?;

            outcome.groups_created = created.len();
            for group in created {
                let id = group.id.ok_or_else(|| {
                    resolve_failure(
                        "create_groups",
                        format!("backend returned group '{}' without an id", group.name),
                    )
                })?;
                created_names.insert(group.name.clone());
                by_name.insert(group.name, id);
            }
        }

        let mut linked = people.to_vec();
        for person in linked.iter_mut().filter(|p| p.needs_link()) {
            let Some(key) = person.group_key.as_deref() else {
                continue;
            };
            let id = by_name.get(key).ok_or_else(|| {
                resolve_failure(
                    "link_people_to_groups",
                    format!("no group resolved for key '{key}'"),
                )
            })?;

            if created_names.contains(key) {
                outcome.linked_to_new += 1;
            } else {
                outcome.linked_to_existing += 1;
            }
            person.group_ref = Some(id.clone());
        }

        self.backend.update_people(&linked).inspect_err(|e| {
            metrics::counter!("linker_failures_total", "stage" => "update").increment(1);
            tracing::warn!(error = %e, "Person update failed");
        })?;
        outcome.people_written = true;
        people.clone_from_slice(&linked);

        metrics::counter!("linker_groups_created_total").increment(outcome.groups_created as u64);
        metrics::counter!("linker_people_linked_total").increment(outcome.people_linked() as u64);

        tracing::info!(
            groups_created = outcome.groups_created,
            linked_to_existing = outcome.linked_to_existing,
            linked_to_new = outcome.linked_to_new,
            skipped_without_key = outcome.skipped_without_key,
            skipped_already_linked = outcome.skipped_already_linked,
            "People linked to groups"
        );

        Ok(outcome)
    }

    /// Looks up stored groups for `keys`. The first group returned for a name wins.
    fn existing_groups(&self, keys: &BTreeSet<String>) -> Result<HashMap<String, GroupId>> {
        let existing = self.backend.query_groups_by_name(keys).inspect_err(|e| {
            metrics::counter!("linker_failures_total", "stage" => "query").increment(1);
            tracing::warn!(error = %e, "Group lookup failed");
        })?;

        let mut by_name = HashMap::with_capacity(existing.len());
        for group in existing {
            if let Some(id) = group.id {
                by_name.entry(group.name).or_insert(id);
            }
        }
        Ok(by_name)
    }
}

/// Counts and logs a run that could not map a key to a group id.
fn resolve_failure(operation: &str, cause: String) -> Error {
    metrics::counter!("linker_failures_total", "stage" => "resolve").increment(1);
    tracing::warn!(operation, cause = %cause, "Group resolution failed");
    Error::OperationFailed {
        operation: operation.to_string(),
        cause,
    }
}
