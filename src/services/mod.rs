//! Business logic services.
//!
//! - [`AccountContactLinker`]: batch upsert-and-link of people to groups
//! - [`RecordService`]: single-record and bulk record maintenance

mod linker;
mod records;

pub use linker::{AccountContactLinker, LinkOutcome};
pub use records::RecordService;
