//! Implementation of the `recsync tag` subcommands.

use super::Settings;
use crate::cli::TagArgs;
use recsync::error::Result;
use recsync::treant::TreantFile;

pub fn cmd_tag_add(settings: &Settings, args: TagArgs) -> Result<()> {
    let mut treant = TreantFile::open_existing(&args.record, &settings.options)?;
    treant.add_tags(args.tags.as_slice())?;
    print_tags(&mut treant)
}

pub fn cmd_tag_remove(settings: &Settings, args: TagArgs) -> Result<()> {
    let mut treant = TreantFile::open_existing(&args.record, &settings.options)?;
    treant.remove_tags(args.tags.as_slice())?;
    print_tags(&mut treant)
}

fn print_tags(treant: &mut TreantFile) -> Result<()> {
    let tags = treant.tags()?;
    if tags.is_empty() {
        println!("{}: no tags", treant.path().display());
    } else {
        println!("{}: {}", treant.path().display(), tags.join(", "));
    }
    Ok(())
}
