//! Implementation of the `recsync init` command.

use super::Settings;
use crate::cli::InitArgs;
use recsync::error::Result;
use recsync::treant::TreantFile;

/// Execute the `recsync init` command.
///
/// This command is **idempotent**: an existing state file is left as it is
/// and reported, never overwritten.
pub fn cmd_init(settings: &Settings, args: InitArgs) -> Result<()> {
    let mut treant = TreantFile::open(
        &args.record,
        Some(args.treant_type.as_str()),
        args.name.as_deref(),
        &settings.options,
    )?;

    let state = treant.state()?;
    if treant.was_created() {
        println!(
            "Created {} '{}' at {}",
            state.treant_type,
            state.name,
            treant.path().display()
        );
    } else {
        println!(
            "{} already exists ({} '{}'); left unchanged.",
            treant.path().display(),
            state.treant_type,
            state.name
        );
    }

    Ok(())
}
