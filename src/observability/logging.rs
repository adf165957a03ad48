//! Structured logging configuration.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Default filter when neither `RUST_LOG` nor the config sets one.
const DEFAULT_FILTER: &str = "warn,contact_linker=info";

/// Filter used when `--verbose` is passed and nothing else is set.
const VERBOSE_FILTER: &str = "info,contact_linker=debug";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, multi-line.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, falling back to `Pretty`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Event filter.
    pub filter: EnvFilter,
    /// Output format.
    pub format: LogFormat,
    /// Optional log file; stderr when `None`.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds logging configuration from config settings and `RUST_LOG`.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        Self::from_parts(settings, verbose, std::env::var("RUST_LOG").ok().as_deref())
    }

    /// Builds logging configuration with an explicit `RUST_LOG` value.
    ///
    /// Filter precedence: `rust_log`, then `logging.level`, then the
    /// verbose or default directive. Invalid directives fall through to
    /// the next source.
    #[must_use]
    pub fn from_parts(settings: &LoggingSettings, verbose: bool, rust_log: Option<&str>) -> Self {
        let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };

        let filter = [rust_log, settings.level.as_deref()]
            .into_iter()
            .flatten()
            .filter(|directive| !directive.trim().is_empty())
            .find_map(|directive| EnvFilter::try_new(directive).ok())
            .unwrap_or_else(|| EnvFilter::new(fallback));

        Self {
            filter,
            format: settings
                .format
                .as_deref()
                .map(LogFormat::parse)
                .unwrap_or_default(),
            file: settings.file.clone(),
        }
    }
}
