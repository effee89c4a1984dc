//! Command-line configuration.
//!
//! Flags fall back to `TODOLIST_*` environment variables, then to defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

pub const DEFAULT_DB_FILE_NAME: &str = "todolist.sqlite3";

#[derive(Parser, Debug)]
#[command(
    name = "todolist",
    version,
    about = "Manage a local to-do list stored in SQLite"
)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, env = "TODOLIST_DB", default_value = DEFAULT_DB_FILE_NAME, global = true)]
    pub db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "TODOLIST_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error (defaults to debug in debug builds, info otherwise)
    #[arg(long, env = "TODOLIST_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show all items sorted by name
    List {
        /// Only show items whose name contains this text (case-sensitive)
        #[arg(long)]
        filter: Option<String>,
    },
    /// Add an item
    Add { name: String },
    /// Rename an item
    Rename { id: Uuid, name: String },
    /// Remove an item
    Remove { id: Uuid },
    /// Show categories and their items
    Categories,
    /// Create a category
    AddCategory { name: String },
    /// File an item under a category
    Assign { item_id: Uuid, category_id: Uuid },
    /// Create a sample category with one linked item
    Demo,
}
