//! Binary entry point for contact-linker.
//!
//! This binary provides the CLI over the record store and the linker.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use contact_linker::config::LinkerConfig;
use contact_linker::observability;
use contact_linker::services::RecordService;
use contact_linker::storage::RecordStorageFactory;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use commands::{
    cmd_add_group, cmd_add_person, cmd_config, cmd_delete_group, cmd_delete_people, cmd_groups,
    cmd_import, cmd_link, cmd_people, cmd_set_key,
};

/// Contact Linker - link contacts to accounts named after their last name.
#[derive(Parser)]
#[command(name = "contact-linker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Import people from a JSON array of `{ "first_name", "group_key" }` objects.
    Import {
        /// Path to the JSON file.
        file: PathBuf,
    },

    /// Link every stored person to the group named after its key.
    Link {
        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List groups.
    Groups {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List people.
    People {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add one group.
    AddGroup {
        /// Group name.
        name: String,
    },

    /// Add one person.
    AddPerson {
        /// First name.
        #[arg(long)]
        first_name: Option<String>,

        /// Group key (last name).
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Change a person's group key; omit the key to clear it.
    SetKey {
        /// Person ID.
        id: String,

        /// New group key.
        key: Option<String>,
    },

    /// Delete people by ID.
    DeletePeople {
        /// Person IDs.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Delete a group; its people become unlinked.
    DeleteGroup {
        /// Group ID.
        id: String,
    },

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

fn run_command(cli: Cli, config: LinkerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Config { show } = cli.command {
        return cmd_config(&config, show);
    }

    let backend = RecordStorageFactory::create(&config.storage)?;
    let service = RecordService::new(backend);

    match cli.command {
        Commands::Import { file } => cmd_import(&service, &file),
        Commands::Link { json } => cmd_link(&service, json),
        Commands::Groups { json } => cmd_groups(&service, json),
        Commands::People { json } => cmd_people(&service, json),
        Commands::AddGroup { name } => cmd_add_group(&service, &name),
        Commands::AddPerson { first_name, key } => {
            cmd_add_person(&service, first_name.as_deref(), key.as_deref())
        },
        Commands::SetKey { id, key } => cmd_set_key(&service, &id, key.as_deref()),
        Commands::DeletePeople { ids } => cmd_delete_people(&service, &ids),
        Commands::DeleteGroup { id } => cmd_delete_group(&service, &id),
        Commands::Config { show } => cmd_config(&config, show),
    }
}

fn load_config(path: Option<&str>) -> contact_linker::Result<LinkerConfig> {
    LinkerConfig::resolve(
        path.map(Path::new),
        LinkerConfig::default_path().as_deref(),
        |key| std::env::var(key).ok(),
    )
}
