//! Implementation of the `recsync compare` command.

use super::Settings;
use crate::cli::RecordArgs;
use recsync::error::{Result, SyncError};
use recsync::treant::TreantFile;

/// Execute the `recsync compare` command.
///
/// Loads the record, then reads it again independently. A difference means
/// the file changed between the two locked reads or no longer decodes.
pub fn cmd_compare(settings: &Settings, args: RecordArgs) -> Result<()> {
    let mut treant = TreantFile::open_existing(&args.record, &settings.options)?;

    if !treant.compare()? {
        return Err(SyncError::Conflict(format!(
            "'{}' changed between two consecutive reads",
            treant.path().display()
        )));
    }

    println!("{}: consistent", treant.path().display());
    Ok(())
}
