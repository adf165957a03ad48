//! Data models for contact-linker.
//!
//! Two record kinds: [`Group`] (an account) and [`Person`] (a contact).

pub mod group;
pub mod person;

pub use group::{Group, GroupId};
pub use person::{Person, PersonId};
