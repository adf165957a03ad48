//! Configuration management.
//!
//! Configuration is read from a TOML file, then environment overrides are
//! applied on top:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `CONTACT_LINKER_BACKEND` | `storage.backend` |
//! | `CONTACT_LINKER_DB_PATH` | `storage.path` |
//! | `CONTACT_LINKER_LOG_FORMAT` | `logging.format` |
//! | `CONTACT_LINKER_LOG_FILE` | `logging.file` |

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::storage::RecordBackendType;
use crate::{Error, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "CONTACT_LINKER_CONFIG_PATH";

/// Main configuration for contact-linker.
#[derive(Debug, Clone, Default)]
pub struct LinkerConfig {
    /// Record storage configuration.
    pub storage: StorageConfig,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Config files that were loaded, in order.
    pub config_sources: Vec<PathBuf>,
}

/// Record storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageConfig {
    /// Which backend to use.
    pub backend: RecordBackendType,
    /// Database path (`SQLite` only). Defaults to the platform data dir.
    pub path: Option<PathBuf>,
}

/// Logging settings as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info` or `contact_linker=debug`.
    pub level: Option<String>,
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Log file to append to instead of stderr.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Storage section.
    pub storage: Option<ConfigFileStorage>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

/// Storage section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStorage {
    /// Backend name.
    pub backend: Option<String>,
    /// Database path.
    pub path: Option<String>,
}

impl LinkerConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or names an
    /// unknown storage backend.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let mut config = Self::parse(&contents)?;
        config.config_sources.push(path.to_path_buf());
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid config TOML.
    pub fn parse(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_config_file(file)
    }

    /// Resolves the configuration used by the binary.
    ///
    /// The file is the first of `cli_path`, the path named by
    /// `CONTACT_LINKER_CONFIG_PATH`, or `default_path` when that file exists.
    /// With none of them the defaults are used. Overrides from `lookup` are
    /// applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected file cannot be read or parsed, or if
    /// an override names an unknown backend.
    pub fn resolve<F>(
        cli_path: Option<&Path>,
        default_path: Option<&Path>,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_path = lookup(CONFIG_PATH_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let mut config = match (cli_path, env_path.as_deref(), default_path) {
            (Some(path), _, _) | (None, Some(path), _) => Self::load_from_file(path)?,
            (None, None, Some(path)) if path.exists() => Self::load_from_file(path)?,
            _ => Self::default(),
        };

        config.apply_overrides_from(lookup)?;
        Ok(config)
    }

    /// Returns the default config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|d| d.config_dir().join("contact-linker").join("config.toml"))
    }

    /// Applies overrides from an arbitrary variable lookup.
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if `CONTACT_LINKER_BACKEND` names an unknown backend.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(backend) = var("CONTACT_LINKER_BACKEND") {
            self.storage.backend = parse_backend(&backend)?;
        }
        if let Some(path) = var("CONTACT_LINKER_DB_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }
        if let Some(format) = var("CONTACT_LINKER_LOG_FORMAT") {
            self.logging.format = Some(format);
        }
        if let Some(file) = var("CONTACT_LINKER_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }
        Ok(())
    }

    /// Converts a `ConfigFile` to `LinkerConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(storage) = file.storage {
            if let Some(backend) = storage.backend {
                config.storage.backend = parse_backend(&backend)?;
            }
            config.storage.path = storage.path.map(PathBuf::from);
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        Ok(config)
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage.path = Some(path.into());
        self
    }
}

fn parse_backend(name: &str) -> Result<RecordBackendType> {
    RecordBackendType::parse(name)
        .ok_or_else(|| Error::InvalidInput(format!("unknown storage backend '{name}'")))
}
