//! Person (contact) model.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::group::GroupId;

/// Unique identifier for a person.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    /// Creates a new person ID from the given string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new random person ID using UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string()[..12].to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PersonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PersonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A person record.
///
/// `group_key` is the candidate group name (the person's last name). Only
/// `None` means "no key"; an empty string is a key like any other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    /// Identifier assigned on create.
    pub id: Option<PersonId>,
    /// Optional first name.
    pub first_name: Option<String>,
    /// Candidate group name.
    pub group_key: Option<String>,
    /// The group this person is linked to.
    pub group_ref: Option<GroupId>,
    /// Creation timestamp (Unix epoch seconds), 0 before save.
    pub created_at: u64,
    /// Last update timestamp (Unix epoch seconds), 0 before save.
    pub updated_at: u64,
}

impl Person {
    /// Creates a new, unsaved person with no key and no link.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the first name.
    #[must_use]
    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    /// Sets the group key.
    #[must_use]
    pub fn with_group_key(mut self, key: impl Into<String>) -> Self {
        self.group_key = Some(key.into());
        self
    }

    /// Sets the group reference.
    #[must_use]
    pub fn with_group_ref(mut self, group_id: GroupId) -> Self {
        self.group_ref = Some(group_id);
        self
    }

    /// Returns `true` if the person has a key but no group yet.
    #[must_use]
    pub const fn needs_link(&self) -> bool {
        self.group_key.is_some() && self.group_ref.is_none()
    }

    /// Returns `true` if the person references a group.
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        self.group_ref.is_some()
    }
}
