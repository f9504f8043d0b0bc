//! Implementation of the `recsync lock` subcommands.

use super::Settings;
use crate::cli::{LockClearArgs, LockListArgs};
use recsync::error::{Result, SyncError};
use recsync::locks::{self, StrategyKind};

pub fn cmd_lock_list(settings: &Settings, args: LockListArgs) -> Result<()> {
    let config = &settings.config;
    let locks = locks::list_locks(&args.dir, &config.lock_suffix, config.lock_stale_minutes)?;

    if settings.options.strategy == StrategyKind::Advisory {
        println!("Note: advisory locks leave no marker; only marker locks are listed.");
    }

    if locks.is_empty() {
        println!("No active locks.");
        return Ok(());
    }

    println!("Active locks ({}):", locks.len());
    println!();

    for lock in &locks {
        println!("  {}:", lock.record.display());
        match &lock.metadata {
            Some(meta) => {
                println!("    Owner:      {}", meta.owner);
                if let Some(pid) = meta.pid {
                    println!("    PID:        {}", pid);
                }
                println!("    Created:    {}", meta.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
                println!("    Age:        {}", meta.age_string());
                println!("    Mode:       {}", meta.mode);
            }
            None => {
                println!("    Metadata:   unreadable");
                println!("    Age:        {}m", lock.age_minutes);
            }
        }
        if lock.is_stale {
            println!("    Status:     STALE (exceeds {} min threshold)", config.lock_stale_minutes);
        }
        println!("    Path:       {}", lock.path.display());
        println!();
    }

    // Summary
    let stale_count = locks.iter().filter(|l| l.is_stale).count();
    if stale_count > 0 {
        println!(
            "Note: {} lock(s) are stale. Use `recsync lock clear <record> --force` to clear.",
            stale_count
        );
    }

    Ok(())
}

pub fn cmd_lock_clear(settings: &Settings, args: LockClearArgs) -> Result<()> {
    // Require --force flag
    if !args.force {
        return Err(SyncError::UserError(format!(
            "refusing to clear lock without --force flag.\n\n\
             Clearing a lock while its holder is still running lets two writers in at once.\n\
             Only clear locks if you are certain the lock holder has crashed.\n\n\
             To clear the lock, run:\n  recsync lock clear {} --force",
            args.record.display()
        )));
    }

    let config = &settings.config;
    let cleared = locks::clear_lock(&args.record, &config.lock_suffix, config.lock_stale_minutes)?;

    println!("Cleared lock: {}", cleared.path.display());
    println!();
    println!("Lock details:");
    match &cleared.metadata {
        Some(meta) => {
            println!("  Owner:      {}", meta.owner);
            if let Some(pid) = meta.pid {
                println!("  PID:        {}", pid);
            }
            println!("  Created:    {}", meta.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("  Age:        {}", meta.age_string());
            println!("  Mode:       {}", meta.mode);
        }
        None => println!("  Metadata:   unreadable"),
    }
    if cleared.is_stale {
        println!("  Status:     was STALE");
    }

    Ok(())
}
