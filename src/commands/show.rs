//! Implementation of the `recsync show` command.
//!
//! Displays the content of a treant state file.

use super::Settings;
use crate::cli::RecordArgs;
use recsync::error::Result;
use recsync::treant::TreantFile;

/// Execute the `recsync show` command.
pub fn cmd_show(settings: &Settings, args: RecordArgs) -> Result<()> {
    let mut treant = TreantFile::open_existing(&args.record, &settings.options)?;
    let state = treant.state()?;

    // Print header
    println!("================================================================================");
    println!("{} [{}]", state.name, state.treant_type);
    println!("================================================================================");
    println!();

    println!("Path:       {}", treant.path().display());
    println!("Version:    {}", state.version);

    if state.tags.is_empty() {
        println!("Tags:       (none)");
    } else {
        println!("Tags:       {}", state.tags.join(", "));
    }

    if !state.categories.is_empty() {
        println!();
        println!("Categories:");
        for (key, value) in &state.categories {
            println!("  {}: {}", key, value);
        }
    }

    if !state.universes.is_empty() {
        println!();
        println!("Universes:");
        for (name, universe) in &state.universes {
            let marker = if state.default_universe.as_deref() == Some(name.as_str()) {
                " (default)"
            } else {
                ""
            };
            println!("  {}{}:", name, marker);
            println!("    Topology:   {}", universe.topology.abs.display());
            println!("    Trajectory: {} segment(s)", universe.trajectory.len());
            if !universe.selections.is_empty() {
                let handles: Vec<&str> = universe.selections.keys().map(String::as_str).collect();
                println!("    Selections: {}", handles.join(", "));
            }
        }
    }

    Ok(())
}
