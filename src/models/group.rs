//! Group (account) model.
//!
//! A group is a named organizational record that people can be linked to.
//! Groups are only ever created by this crate, never renamed, so a group's
//! name is fixed for its lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Creates a new group ID from the given string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new random group ID using UUID v4.
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

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for GroupId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A group record.
///
/// `id` is `None` until the record store persists the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Identifier assigned on create.
    #[serde(default)]
    pub id: Option<GroupId>,
    /// Display name; people link to a group whose name equals their key.
    pub name: String,
    /// Creation timestamp (Unix epoch seconds), 0 before save.
    #[serde(default)]
    pub created_at: u64,
}

impl Group {
    /// Creates a new, unsaved group.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            created_at: 0,
        }
    }

    /// Returns `true` once the group has been assigned an id.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_id_generate() {
        let id1 = GroupId::generate();
        let id2 = GroupId::generate();
        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), 12);
    }

    #[test]
    fn test_new_group_is_unsaved() {
        let group = Group::new("Smith");
        assert_eq!(group.name, "Smith");
        assert!(!group.is_persisted());
        assert_eq!(group.created_at, 0);
    }

    #[test]
    fn test_group_deserializes_without_id() {
        let group: Group = serde_json::from_str(r#"{"name":"Doe"}"#).expect("valid json");
        assert_eq!(group, Group::new("Doe"));
    }
}
