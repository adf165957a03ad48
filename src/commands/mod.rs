//! Command handlers module.
//!
//! - `records.rs`: import, listing, add, update and delete commands
//! - `link.rs`: the link command
//! - `config.rs`: configuration display command

mod config;
mod link;
mod records;

pub use config::cmd_config;
pub use link::cmd_link;
pub use records::{
    cmd_add_group, cmd_add_person, cmd_delete_group, cmd_delete_people, cmd_groups, cmd_import,
    cmd_people, cmd_set_key,
};
