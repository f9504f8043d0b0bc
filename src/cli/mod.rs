//! CLI argument parsing for recsync.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::Parser;
use clap::Subcommand;
use recsync::locks::StrategyKind;
use recsync::schema::CategoryValue;
use std::path::PathBuf;

/// recsync: process-safe access to shared treant state files.
///
/// Every command takes the record's lock, works on it, verifies what it
/// wrote and releases the lock before exiting, so it can run alongside
/// other processes using the same files.
#[derive(Parser, Debug)]
#[command(name = "recsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// YAML config file. Built-in defaults apply when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Lock strategy, overriding the config file (marker or advisory).
    #[arg(long, global = true, value_name = "STRATEGY")]
    pub strategy: Option<StrategyKind>,

    /// Log lock traffic and verification details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for recsync.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a treant state file.
    ///
    /// Does nothing if the file already exists.
    Init(InitArgs),

    /// Print the contents of a state file.
    Show(RecordArgs),

    /// Tag management commands.
    Tag(TagCommand),

    /// Category management commands.
    Category(CategoryCommand),

    /// Check that a state file reads back consistently.
    ///
    /// Exits with the conflict code when it does not.
    Compare(RecordArgs),

    /// Lock management commands.
    ///
    /// List or clear lock markers left by the marker strategy.
    Lock(LockCommand),
}

/// Arguments for the `init` command.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path of the state file to create (e.g., Sim.json).
    pub record: PathBuf,

    /// Treant name. Defaults to the file stem.
    #[arg(long)]
    pub name: Option<String>,

    /// Treant type stored in the new file.
    #[arg(long = "type", default_value = "Treant")]
    pub treant_type: String,
}

/// Arguments naming a single state file.
#[derive(Parser, Debug)]
pub struct RecordArgs {
    /// Path of the state file.
    pub record: PathBuf,
}

/// Tag subcommands.
#[derive(Parser, Debug)]
pub struct TagCommand {
    #[command(subcommand)]
    pub action: TagAction,
}

#[derive(Subcommand, Debug)]
pub enum TagAction {
    /// Add tags; tags already present are kept once.
    Add(TagArgs),

    /// Remove tags; missing tags are ignored.
    Remove(TagArgs),
}

#[derive(Parser, Debug)]
pub struct TagArgs {
    /// Path of the state file.
    pub record: PathBuf,

    #[arg(required = true)]
    pub tags: Vec<String>,
}

/// Category subcommands.
#[derive(Parser, Debug)]
pub struct CategoryCommand {
    #[command(subcommand)]
    pub action: CategoryAction,
}

#[derive(Subcommand, Debug)]
pub enum CategoryAction {
    /// Set categories given as key=value pairs.
    ///
    /// Values that parse as booleans or numbers are stored as such.
    Set(CategorySetArgs),

    /// Remove categories by key.
    Remove(CategoryRemoveArgs),
}

#[derive(Parser, Debug)]
pub struct CategorySetArgs {
    /// Path of the state file.
    pub record: PathBuf,

    #[arg(required = true, value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub pairs: Vec<(String, CategoryValue)>,
}

#[derive(Parser, Debug)]
pub struct CategoryRemoveArgs {
    /// Path of the state file.
    pub record: PathBuf,

    #[arg(required = true)]
    pub keys: Vec<String>,
}

/// Lock subcommands.
#[derive(Parser, Debug)]
pub struct LockCommand {
    #[command(subcommand)]
    pub action: LockAction,
}

/// Available lock actions.
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// List lock markers in a directory.
    ///
    /// Shows owner, age and mode, and flags stale markers.
    List(LockListArgs),

    /// Remove the lock marker of a record.
    ///
    /// Requires --force flag to prevent accidental clearing.
    Clear(LockClearArgs),
}

/// Arguments for the `lock list` command.
#[derive(Parser, Debug)]
pub struct LockListArgs {
    /// Directory to scan.
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

/// Arguments for the `lock clear` command.
#[derive(Parser, Debug)]
pub struct LockClearArgs {
    /// State file whose lock marker should be removed.
    pub record: PathBuf,

    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

fn parse_key_value(s: &str) -> Result<(String, CategoryValue), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("missing key in '{}'", s));
    }
    let value = value.parse::<CategoryValue>().map_err(|e| e.to_string())?;
    Ok((key.to_string(), value))
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
