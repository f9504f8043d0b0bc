//! Treant state files: a named, tagged, categorized container of universes.
//!
//! [`TreantFile`] is the domain object over a [`SyncedRecord`] of
//! [`TreantState`]. Every getter reloads the record under a shared lock and
//! every mutator is one locked read-modify-write, so several processes can
//! work on the same treant without coordinating.

use crate::error::{Result, SyncError};
use crate::schema::{CategoryValue, PathPair, TreantSchema, TreantState, Universe};
use crate::synced::{SyncOptions, SyncedRecord};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Treant type written into new state files unless told otherwise.
pub const DEFAULT_TREANT_TYPE: &str = "Treant";

/// Synchronized handle on one treant state file.
#[derive(Debug)]
pub struct TreantFile {
    record: SyncedRecord<TreantSchema>,
}

impl TreantFile {
    /// Open a state file, creating it when absent.
    ///
    /// `name` defaults to the file stem. Both `treant_type` and `name` only
    /// matter when the file is created; an existing file keeps its own.
    pub fn open(
        path: impl AsRef<Path>,
        treant_type: Option<&str>,
        name: Option<&str>,
        options: &SyncOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let name = match name {
            Some(name) => name.to_string(),
            None => file_stem(path)?,
        };
        let schema = TreantSchema::new(treant_type.unwrap_or(DEFAULT_TREANT_TYPE), &name);
        Ok(Self {
            record: SyncedRecord::open(path, schema, options)?,
        })
    }

    /// Open a state file that must already exist.
    pub fn open_existing(path: impl AsRef<Path>, options: &SyncOptions) -> Result<Self> {
        let path = path.as_ref();
        let schema = TreantSchema::new(DEFAULT_TREANT_TYPE, &file_stem(path)?);
        Ok(Self {
            record: SyncedRecord::open_existing(path, schema, options)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.record.path()
    }

    /// Directory holding the state file. Relative paths are stored against it.
    pub fn location(&self) -> PathBuf {
        match self.record.path().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Whether opening this handle created the state file.
    pub fn was_created(&self) -> bool {
        self.record.was_created()
    }

    /// Fresh copy of the whole state.
    pub fn state(&mut self) -> Result<TreantState> {
        Ok(self.record.read()?.clone())
    }

    /// Whether the state file still matches what this handle last saw.
    pub fn compare(&mut self) -> Result<bool> {
        self.record.compare()
    }

    pub fn treant_type(&mut self) -> Result<String> {
        self.record.get(|s| s.treant_type.clone())
    }

    // =========================================================================
    // Name
    // =========================================================================

    pub fn name(&mut self) -> Result<String> {
        self.record.get(|s| s.name.clone())
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(SyncError::UserError("treant name must not be empty".to_string()));
        }
        self.record.write(|s| s.name = name.to_string())
    }

    // =========================================================================
    // Tags
    // =========================================================================

    pub fn tags(&mut self) -> Result<Vec<String>> {
        self.record.get(|s| s.tags.clone())
    }

    pub fn add_tags<S: AsRef<str>>(&mut self, tags: &[S]) -> Result<()> {
        self.record.try_write(|s| s.add_tags(tags))
    }

    pub fn remove_tags<S: AsRef<str>>(&mut self, tags: &[S]) -> Result<()> {
        self.record.write(|s| s.remove_tags(tags))
    }

    pub fn clear_tags(&mut self) -> Result<()> {
        self.record.write(|s| s.tags.clear())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub fn categories(&mut self) -> Result<BTreeMap<String, CategoryValue>> {
        self.record.get(|s| s.categories.clone())
    }

    pub fn add_categories<I, K>(&mut self, categories: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, CategoryValue)>,
        K: Into<String>,
    {
        self.record.try_write(|s| s.add_categories(categories))
    }

    pub fn remove_categories<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<()> {
        self.record.write(|s| s.remove_categories(keys))
    }

    // =========================================================================
    // Universes
    // =========================================================================

    pub fn list_universes(&mut self) -> Result<Vec<String>> {
        self.record.get(|s| s.universes.keys().cloned().collect())
    }

    pub fn get_universe(&mut self, name: &str) -> Result<Universe> {
        self.record
            .get(|s| s.universes.get(name).cloned())?
            .ok_or_else(|| missing_universe(name))
    }

    /// Define `name` from a topology and trajectory files.
    ///
    /// Paths are stored absolute and relative to [`location`](Self::location).
    /// An existing universe of the same name is replaced along with its
    /// selections.
    pub fn add_universe<P: AsRef<Path>>(
        &mut self,
        name: &str,
        topology: &Path,
        trajectory: &[P],
    ) -> Result<()> {
        let location = self.location();
        let topology = PathPair::new(topology, &location)?;
        let trajectory = trajectory
            .iter()
            .map(|t| PathPair::new(t.as_ref(), &location))
            .collect::<Result<Vec<_>>>()?;

        self.record
            .try_write(|s| s.add_universe(name, topology, trajectory))
    }

    pub fn remove_universe(&mut self, name: &str) -> Result<()> {
        self.record.try_write(|s| s.remove_universe(name))
    }

    pub fn rename_universe(&mut self, name: &str, new_name: &str) -> Result<()> {
        self.record.try_write(|s| s.rename_universe(name, new_name))
    }

    pub fn default_universe(&mut self) -> Result<Option<String>> {
        self.record.get(|s| s.default_universe.clone())
    }

    /// Mark an existing universe as the default; `None` clears it.
    pub fn set_default_universe(&mut self, name: Option<&str>) -> Result<()> {
        self.record.try_write(|s| s.set_default_universe(name))
    }

    // =========================================================================
    // Selections
    // =========================================================================

    pub fn list_selections(&mut self, universe: &str) -> Result<Vec<String>> {
        self.get_universe(universe)
            .map(|u| u.selections.into_keys().collect())
    }

    pub fn get_selection(&mut self, universe: &str, handle: &str) -> Result<Vec<String>> {
        self.get_universe(universe)?
            .selections
            .remove(handle)
            .ok_or_else(|| {
                SyncError::UserError(format!(
                    "no selection '{}' in universe '{}'",
                    handle, universe
                ))
            })
    }

    pub fn add_selection<S: AsRef<str>>(
        &mut self,
        universe: &str,
        handle: &str,
        selection: &[S],
    ) -> Result<()> {
        self.record
            .try_write(|s| s.add_selection(universe, handle, selection))
    }

    pub fn remove_selection(&mut self, universe: &str, handle: &str) -> Result<()> {
        self.record
            .try_write(|s| s.remove_selection(universe, handle))
    }
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| {
            SyncError::UserError(format!("'{}' does not name a file", path.display()))
        })
}

fn missing_universe(name: &str) -> SyncError {
    SyncError::UserError(format!("no such universe '{}'", name))
}
