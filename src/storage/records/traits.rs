//! Record storage trait definitions.
//!
//! Defines the interface the linker and record service use to reach the
//! system of record. Every batch operation is all-or-nothing.

use std::collections::BTreeSet;

use crate::Result;
use crate::models::{Group, GroupId, Person, PersonId};

/// Trait for record storage backends.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait RecordBackend: Send + Sync {
    // =========================================================================
    // Group Operations
    // =========================================================================

    /// Returns the stored groups whose name is exactly one of `names`.
    ///
    /// Several groups may share a name; all of them are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn query_groups_by_name(&self, names: &BTreeSet<String>) -> Result<Vec<Group>>;

    /// Creates the given unsaved groups in one batch.
    ///
    /// # Returns
    ///
    /// The same groups, in the same order, with ids and timestamps assigned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A group already carries an id
    /// - Storage cannot be accessed
    ///
    /// On error nothing is stored.
    fn create_groups(&self, groups: Vec<Group>) -> Result<Vec<Group>>;

    /// Lists all groups, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn list_groups(&self) -> Result<Vec<Group>>;

    /// Deletes a group. People referencing it have their reference cleared.
    ///
    /// # Returns
    ///
    /// True if the group was deleted, false if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn delete_group(&self, group_id: &GroupId) -> Result<bool>;

    // =========================================================================
    // Person Operations
    // =========================================================================

    /// Creates the given unsaved people in one batch.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A person already carries an id
    /// - A person references a group that does not exist
    /// - Storage cannot be accessed
    ///
    /// On error nothing is stored.
    fn create_people(&self, people: Vec<Person>) -> Result<Vec<Person>>;

    /// Writes the key and group reference of every given person.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A person has no id, or an id the store does not hold
    /// - A person references a group that does not exist
    /// - Storage cannot be accessed
    ///
    /// On error nothing is written.
    fn update_people(&self, people: &[Person]) -> Result<()>;

    /// Gets a person by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn get_person(&self, person_id: &PersonId) -> Result<Option<Person>>;

    /// Lists all people in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn list_people(&self) -> Result<Vec<Person>>;

    /// Deletes the given people. Unknown ids are ignored.
    ///
    /// # Returns
    ///
    /// Number of people deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn delete_people(&self, person_ids: &[PersonId]) -> Result<u64>;
}
