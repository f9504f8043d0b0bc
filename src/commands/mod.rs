//! Command implementations for recsync.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command resolves [`Settings`] once, then works
//! through the library's public API only.

mod category;
mod compare;
mod init;
mod lock;
mod show;
mod tag;


use crate::cli::{CategoryAction, Cli, Command, LockAction, TagAction};
use recsync::config::Config;
use recsync::error::Result;
use recsync::locks::StrategyKind;
use recsync::synced::SyncOptions;
use std::path::Path;

/// Configuration resolved from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    pub options: SyncOptions,
}

impl Settings {
    /// Load the config file if one was given, then apply overrides.
    pub fn load(config_path: Option<&Path>, strategy: Option<StrategyKind>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(strategy) = strategy {
            config.strategy = strategy;
        }
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Config) -> Self {
        let options = SyncOptions::from_config(&config);
        Self { config, options }
    }
}

/// Resolve settings and run the parsed command.
pub fn dispatch(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref(), cli.strategy)?;
    log::debug!("using {} locks", settings.options.strategy);
    run(&settings, cli.command)
}

/// Route a command to its handler.
pub fn run(settings: &Settings, command: Command) -> Result<()> {
    match command {
        Command::Init(args) => init::cmd_init(settings, args),
        Command::Show(args) => show::cmd_show(settings, args),
        Command::Tag(tag_cmd) => match tag_cmd.action {
            TagAction::Add(args) => tag::cmd_tag_add(settings, args),
            TagAction::Remove(args) => tag::cmd_tag_remove(settings, args),
        },
        Command::Category(category_cmd) => match category_cmd.action {
            CategoryAction::Set(args) => category::cmd_category_set(settings, args),
            CategoryAction::Remove(args) => category::cmd_category_remove(settings, args),
        },
        Command::Compare(args) => compare::cmd_compare(settings, args),
        Command::Lock(lock_cmd) => match lock_cmd.action {
            LockAction::List(args) => lock::cmd_lock_list(settings, args),
            LockAction::Clear(args) => lock::cmd_lock_clear(settings, args),
        },
    }
}
