//! Global logging initialization.
//!
//! Kept in its own test binary: the subscriber is process-wide.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use contact_linker::config::LoggingSettings;
use contact_linker::observability::{self, LoggingConfig};
use contact_linker::Error;

#[test]
fn test_second_init_is_rejected() {
    let settings = LoggingSettings::default();

    observability::init(LoggingConfig::from_parts(&settings, false, None))
        .expect("first init");

    let again = observability::init(LoggingConfig::from_parts(&settings, false, None));
    assert!(matches!(
        again,
        Err(Error::OperationFailed { ref operation, .. }) if operation == "observability_init"
    ));
}
