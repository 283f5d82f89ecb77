//! shelf CLI
//!
//! Command-line interface for shelf - categorized wish-lists.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use shelf_core::{Config, MergeStrategy, StorageError, Store};

mod commands;
mod editor;
mod image;
mod output;
mod tui;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "shelf - Categorized wish-lists for movies, series and more")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI interface
    Tui,
    /// Add an item
    Add {
        /// Item name
        name: String,
        /// Category (defaults to the active one)
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        /// Year
        #[arg(short, long)]
        year: Option<String>,
        /// Desirability rating (0 or absent means 5)
        #[arg(short, long)]
        rating: Option<i64>,
        /// Image file to embed
        #[arg(short, long, value_name = "PATH")]
        image: Option<PathBuf>,
    },
    /// List items of the active category
    #[command(alias = "ls")]
    List {
        /// Show another category without switching to it
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },
    /// Show item details
    Show {
        /// Item ID (full or prefix)
        id: String,
    },
    /// Edit an item
    Edit {
        /// Item ID (full or prefix)
        id: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New category
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        /// New year
        #[arg(short, long)]
        year: Option<String>,
        /// New rating
        #[arg(short, long)]
        rating: Option<i64>,
        /// Replace the image with this file
        #[arg(short, long, value_name = "PATH", conflicts_with = "clear_image")]
        image: Option<PathBuf>,
        /// Remove the image
        #[arg(long)]
        clear_image: bool,
    },
    /// Delete an item
    #[command(alias = "rm")]
    Delete {
        /// Item ID (full or prefix)
        id: String,
    },
    /// Switch the active category
    Use {
        /// Category name
        kind: String,
    },
    /// List categories with item counts
    Types,
    /// Toggle sorting by rating
    Sort,
    /// Move an item within the active category
    Move {
        /// Item ID (full or prefix)
        id: String,
        /// New position, starting at 1
        position: usize,
    },
    /// Set the full order of the active category
    Order {
        /// Item IDs (full or prefix) in the new order; unlisted items are removed
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Export the whole store to a file
    Export {
        /// Output file
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import an exported file
    Import {
        /// File to import
        file: PathBuf,
        /// How to combine with existing data (asks when omitted)
        #[arg(short, long, value_enum)]
        strategy: Option<StrategyArg>,
    },
    /// Show status (counts, storage usage)
    Status,
    /// Delete everything in the store
    Reset {
        /// Skip confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, store_key, quota_bytes, types, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Keep existing data, imported items win on conflicts
    Merge,
    /// Wipe the store and restore the file
    Replace,
}

impl From<StrategyArg> for MergeStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Merge => MergeStrategy::Merge,
            StrategyArg::Replace => MergeStrategy::Replace,
        }
    }
}

fn main() -> Result<()> {
    let result = run(Cli::parse());

    if let Err(err) = &result {
        if let Some(hint) = storage_hint(err) {
            eprintln!("Hint: {}", hint);
        }
    }
    result
}

fn run(cli: Cli) -> Result<()> {
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Commands that don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;

    // Handle TUI (default when no command given)
    if matches!(&cli.command, Some(Commands::Tui) | None) {
        return tui::run(config);
    }

    init_logging();

    let mut store = Store::open_with_config(config)?;

    let Some(command) = cli.command else {
        return Ok(());
    };

    match command {
        Commands::Tui | Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Add {
            name,
            kind,
            year,
            rating,
            image,
        } => commands::item::add(&mut store, name, kind, year, rating, image, &output),
        Commands::List { kind } => commands::item::list(&store, kind, &output),
        Commands::Show { id } => commands::item::show(&store, &id, &output),
        Commands::Edit {
            id,
            name,
            kind,
            year,
            rating,
            image,
            clear_image,
        } => {
            let edit = commands::item::EditArgs {
                name,
                kind,
                year,
                rating,
                image,
                clear_image,
            };
            commands::item::edit(&mut store, &id, edit, &output)
        }
        Commands::Delete { id } => commands::item::delete(&mut store, &id, &output),
        Commands::Use { kind } => commands::category::use_type(&mut store, &kind, &output),
        Commands::Types => commands::category::list(&store, &output),
        Commands::Sort => commands::category::toggle_sort(&mut store, &output),
        Commands::Move { id, position } => {
            commands::order::move_to(&mut store, &id, position, &output)
        }
        Commands::Order { ids } => commands::order::set_order(&mut store, &ids, &output),
        Commands::Export { output: path } => commands::backup::export(&store, path, &output),
        Commands::Import { file, strategy } => {
            commands::backup::import(&mut store, &file, strategy.map(Into::into), &output)
        }
        Commands::Status => commands::status::show(&store, &output),
        Commands::Reset { yes } => commands::backup::reset(&mut store, yes, &output),
    }
}

/// Recovery suggestion for a storage failure anywhere in the error chain
fn storage_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<StorageError>())
        .and_then(StorageError::recovery_suggestion)
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Log to stderr, filtered by SHELF_LOG (default: warnings only)
fn init_logging() {
    let level = std::env::var("SHELF_LOG").unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::new(format!("shelf_core={},shelf_cli={}", level, level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn test_hint_for_damaged_database_at_open() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        std::fs::write(config.sqlite_path(), "not a database ".repeat(200)).unwrap();

        let err = match Store::open_with_config(config) {
            Ok(_) => panic!("opening a damaged database should fail"),
            Err(err) => err,
        };
        let hint = storage_hint(&err).unwrap();
        assert!(hint.contains("damaged"));
    }

    #[test]
    fn test_hint_for_quota_after_open() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            quota_bytes: 60,
            ..config_in(&temp_dir)
        };
        let mut store = Store::open_with_config(config).unwrap();

        let err = store
            .add_item(shelf_core::ItemDraft::new("movies", "x".repeat(200)))
            .unwrap_err();
        assert!(storage_hint(&err).unwrap().contains("quota_bytes"));
    }

    #[test]
    fn test_no_hint_for_other_errors() {
        let err = anyhow::anyhow!("No item matches 'zzz'");
        assert!(storage_hint(&err).is_none());
    }
}
