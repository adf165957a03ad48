//! Config command handler.

use contact_linker::config::LinkerConfig;
use contact_linker::storage::{RecordBackendType, SqliteRecordBackend};

/// Config command.
pub fn cmd_config(config: &LinkerConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !show {
        println!("Use --show to display the current configuration");
        return Ok(());
    }

    println!("Current Configuration");
    println!("=====================");
    println!();

    println!("Config Files Loaded:");
    if config.config_sources.is_empty() {
        println!("  (none - using defaults)");
    } else {
        for source in &config.config_sources {
            println!("  - {}", source.display());
        }
    }
    println!();

    println!("Storage:");
    println!("  Backend: {}", config.storage.backend.as_str());
    if config.storage.backend == RecordBackendType::Sqlite {
        let path = config
            .storage
            .path
            .clone()
            .or_else(SqliteRecordBackend::default_path);
        println!(
            "  Path: {}",
            path.map_or_else(|| "(unavailable)".to_string(), |p| p.display().to_string())
        );
    }
    println!();

    println!("Logging:");
    println!(
        "  Level: {}",
        config.logging.level.as_deref().unwrap_or("(default)")
    );
    println!(
        "  Format: {}",
        config.logging.format.as_deref().unwrap_or("pretty")
    );
    println!(
        "  File: {}",
        config
            .logging
            .file
            .as_ref()
            .map_or_else(|| "(stderr)".to_string(), |p| p.display().to_string())
    );

    Ok(())
}
