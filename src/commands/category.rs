//! Implementation of the `recsync category` subcommands.

use super::Settings;
use crate::cli::{CategoryRemoveArgs, CategorySetArgs};
use recsync::error::Result;
use recsync::treant::TreantFile;

pub fn cmd_category_set(settings: &Settings, args: CategorySetArgs) -> Result<()> {
    let mut treant = TreantFile::open_existing(&args.record, &settings.options)?;
    let count = args.pairs.len();
    treant.add_categories(args.pairs)?;
    println!("{}: set {} categor{}", treant.path().display(), count, plural_y(count));
    Ok(())
}

pub fn cmd_category_remove(settings: &Settings, args: CategoryRemoveArgs) -> Result<()> {
    let mut treant = TreantFile::open_existing(&args.record, &settings.options)?;
    treant.remove_categories(args.keys.as_slice())?;
    let remaining = treant.categories()?.len();
    println!(
        "{}: {} categor{} remaining",
        treant.path().display(),
        remaining,
        plural_y(remaining)
    );
    Ok(())
}

fn plural_y(count: usize) -> &'static str {
    if count == 1 { "y" } else { "ies" }
}
