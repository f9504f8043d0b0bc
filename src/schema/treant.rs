//! The treant state document.
//!
//! A treant is a directory-backed object described by one state file holding
//! its name, tags, categories and, for simulations, named universes: pairs of
//! topology and trajectory paths plus stored atom selections.
//!
//! Every mutation here is a plain function on [`TreantState`] so that it can
//! run inside a locked read/modify/write cycle.

use super::{Schema, encode_json};
use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Maximum length of tag, category, universe and selection names.
pub const MAX_NAME_LEN: usize = 55;

/// A category value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryValue::Bool(b) => write!(f, "{}", b),
            CategoryValue::Int(i) => write!(f, "{}", i),
            CategoryValue::Float(x) => write!(f, "{}", x),
            CategoryValue::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for CategoryValue {
    type Err = SyncError;

    /// Booleans and numbers are recognized; anything else is text.
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(b) = s.parse::<bool>() {
            return Ok(CategoryValue::Bool(b));
        }
        if let Ok(i) = s.parse::<i64>() {
            return Ok(CategoryValue::Int(i));
        }
        if let Ok(x) = s.parse::<f64>()
            && x.is_finite()
        {
            return Ok(CategoryValue::Float(x));
        }
        Ok(CategoryValue::Text(s.to_string()))
    }
}

impl From<&str> for CategoryValue {
    fn from(s: &str) -> Self {
        CategoryValue::Text(s.to_string())
    }
}

impl From<i64> for CategoryValue {
    fn from(i: i64) -> Self {
        CategoryValue::Int(i)
    }
}

impl From<bool> for CategoryValue {
    fn from(b: bool) -> Self {
        CategoryValue::Bool(b)
    }
}

impl From<f64> for CategoryValue {
    fn from(x: f64) -> Self {
        CategoryValue::Float(x)
    }
}

/// A file path stored both absolute and relative to the treant directory.
///
/// The relative form lets a moved treant find files that moved with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPair {
    pub abs: PathBuf,
    pub rel: PathBuf,
}

impl PathPair {
    /// Record `path` as seen from the treant directory `location`.
    ///
    /// Relative inputs are resolved against the current directory.
    pub fn new(path: &Path, location: &Path) -> Result<Self> {
        let abs = absolute(path)?;
        let base = absolute(location)?;
        Ok(Self {
            rel: relative_to(&abs, &base),
            abs,
        })
    }
}

/// One topology with its ordered trajectory segments and saved selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    pub topology: PathPair,
    #[serde(default)]
    pub trajectory: Vec<PathPair>,
    #[serde(default)]
    pub selections: BTreeMap<String, Vec<String>>,
}

/// Contents of a treant state file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreantState {
    pub treant_type: String,
    pub name: String,
    pub version: String,
    pub tags: Vec<String>,
    pub categories: BTreeMap<String, CategoryValue>,
    pub universes: BTreeMap<String, Universe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_universe: Option<String>,
}

impl Default for TreantState {
    fn default() -> Self {
        Self::new("Treant", "")
    }
}

impl TreantState {
    pub fn new(treant_type: &str, name: &str) -> Self {
        Self {
            treant_type: treant_type.to_string(),
            name: name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            tags: Vec::new(),
            categories: BTreeMap::new(),
            universes: BTreeMap::new(),
            default_universe: None,
        }
    }

    /// Append tags not already present, keeping insertion order.
    pub fn add_tags<S: AsRef<str>>(&mut self, tags: &[S]) -> Result<()> {
        for tag in tags {
            validate_name("tag", tag.as_ref())?;
        }
        for tag in tags {
            let tag = tag.as_ref();
            if !self.tags.iter().any(|t| t == tag) {
                self.tags.push(tag.to_string());
            }
        }
        Ok(())
    }

    /// Remove the given tags; absent tags are ignored.
    pub fn remove_tags<S: AsRef<str>>(&mut self, tags: &[S]) {
        self.tags.retain(|t| !tags.iter().any(|r| r.as_ref() == t.as_str()));
    }

    /// Insert or overwrite categories.
    pub fn add_categories<I, K>(&mut self, categories: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, CategoryValue)>,
        K: Into<String>,
    {
        let categories: Vec<(String, CategoryValue)> = categories
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();

        for (key, value) in &categories {
            validate_name("category", key)?;
            if let CategoryValue::Float(x) = value
                && !x.is_finite()
            {
                return Err(SyncError::UserError(format!(
                    "category '{}' must be a finite number",
                    key
                )));
            }
        }

        self.categories.extend(categories);
        Ok(())
    }

    /// Remove the given categories; absent keys are ignored.
    pub fn remove_categories<S: AsRef<str>>(&mut self, keys: &[S]) {
        for key in keys {
            self.categories.remove(key.as_ref());
        }
    }

    /// Define a universe, replacing any previous definition and its selections.
    pub fn add_universe(
        &mut self,
        name: &str,
        topology: PathPair,
        trajectory: Vec<PathPair>,
    ) -> Result<()> {
        validate_name("universe", name)?;
        self.universes.insert(
            name.to_string(),
            Universe {
                topology,
                trajectory,
                selections: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Delete a universe; clears the default when it pointed there.
    pub fn remove_universe(&mut self, name: &str) -> Result<()> {
        if self.universes.remove(name).is_none() {
            return Err(no_such_universe(name));
        }
        if self.default_universe.as_deref() == Some(name) {
            self.default_universe = None;
        }
        Ok(())
    }

    pub fn rename_universe(&mut self, name: &str, new_name: &str) -> Result<()> {
        validate_name("universe", new_name)?;
        if self.universes.contains_key(new_name) {
            return Err(SyncError::UserError(format!(
                "universe '{}' already exists",
                new_name
            )));
        }
        let universe = self
            .universes
            .remove(name)
            .ok_or_else(|| no_such_universe(name))?;
        self.universes.insert(new_name.to_string(), universe);

        if self.default_universe.as_deref() == Some(name) {
            self.default_universe = Some(new_name.to_string());
        }
        Ok(())
    }

    /// Mark a universe as the default, or clear the preference with `None`.
    pub fn set_default_universe(&mut self, name: Option<&str>) -> Result<()> {
        if let Some(name) = name
            && !self.universes.contains_key(name)
        {
            return Err(no_such_universe(name));
        }
        self.default_universe = name.map(str::to_string);
        Ok(())
    }

    /// Store a selection; an existing selection with the same handle is replaced.
    pub fn add_selection<S: AsRef<str>>(
        &mut self,
        universe: &str,
        handle: &str,
        selection: &[S],
    ) -> Result<()> {
        validate_name("selection", handle)?;
        let universe = self
            .universes
            .get_mut(universe)
            .ok_or_else(|| no_such_universe(universe))?;
        universe.selections.insert(
            handle.to_string(),
            selection.iter().map(|s| s.as_ref().to_string()).collect(),
        );
        Ok(())
    }

    pub fn remove_selection(&mut self, universe: &str, handle: &str) -> Result<()> {
        let selections = &mut self
            .universes
            .get_mut(universe)
            .ok_or_else(|| no_such_universe(universe))?
            .selections;
        if selections.remove(handle).is_none() {
            return Err(SyncError::UserError(format!(
                "no selection '{}' in universe '{}'",
                handle, universe
            )));
        }
        Ok(())
    }
}

/// Schema for treant state files.
///
/// New records start with the configured type and name.
#[derive(Debug, Clone)]
pub struct TreantSchema {
    treant_type: String,
    name: String,
}

impl TreantSchema {
    pub fn new(treant_type: &str, name: &str) -> Self {
        Self {
            treant_type: treant_type.to_string(),
            name: name.to_string(),
        }
    }
}

impl Schema for TreantSchema {
    type Cache = TreantState;

    fn decode(&self, bytes: &[u8]) -> Result<TreantState> {
        serde_json::from_slice(bytes)
            .map_err(|e| SyncError::Corrupt(format!("invalid treant state: {}", e)))
    }

    fn encode(&self, cache: &TreantState) -> Result<Vec<u8>> {
        encode_json(cache)
    }

    fn default_cache(&self) -> TreantState {
        TreantState::new(&self.treant_type, &self.name)
    }
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SyncError::UserError(format!("{} name must not be empty", kind)));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(SyncError::UserError(format!(
            "{} name '{}' exceeds {} characters",
            kind, name, MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn no_such_universe(name: &str) -> SyncError {
    SyncError::UserError(format!("no such universe '{}'; add it first", name))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| SyncError::from_io(e, "resolve path", path))
}

/// Express `path` relative to `base`. Both must be absolute.
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path: Vec<Component> = path.components().collect();
    let base: Vec<Component> = base.components().collect();

    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for component in &path[common..] {
        rel.push(component.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe_paths() -> (PathPair, Vec<PathPair>) {
        let location = Path::new("/sims/run1");
        let top = PathPair::new(Path::new("/sims/run1/system.gro"), location).unwrap();
        let traj = vec![
            PathPair::new(Path::new("/sims/run1/md.part1.xtc"), location).unwrap(),
            PathPair::new(Path::new("/data/md.part2.xtc"), location).unwrap(),
        ];
        (top, traj)
    }

    #[test]
    fn relative_paths() {
        assert_eq!(
            relative_to(Path::new("/a/b/c.txt"), Path::new("/a/b")),
            PathBuf::from("c.txt")
        );
        assert_eq!(
            relative_to(Path::new("/a/x/c.txt"), Path::new("/a/b/d")),
            PathBuf::from("../../x/c.txt")
        );
        assert_eq!(relative_to(Path::new("/a"), Path::new("/a")), PathBuf::from("."));
    }

    #[test]
    fn path_pair_records_both_forms() {
        let (top, traj) = universe_paths();
        assert_eq!(top.abs, PathBuf::from("/sims/run1/system.gro"));
        assert_eq!(top.rel, PathBuf::from("system.gro"));
        assert_eq!(traj[1].rel, PathBuf::from("../../data/md.part2.xtc"));
    }

    #[test]
    fn tags_are_unique_and_ordered() {
        let mut state = TreantState::new("Sim", "run1");
        state.add_tags(&["mark", "932", "mark", "luke"]).unwrap();
        assert_eq!(state.tags, vec!["mark", "932", "luke"]);

        state.remove_tags(&["932", "absent"]);
        assert_eq!(state.tags, vec!["mark", "luke"]);
    }

    #[test]
    fn invalid_tag_rejects_whole_batch() {
        let mut state = TreantState::new("Sim", "run1");
        let long = "x".repeat(MAX_NAME_LEN + 1);

        assert!(state.add_tags(&["ok", long.as_str()]).is_err());
        assert!(state.add_tags(&[""]).is_err());
        assert!(state.tags.is_empty());
    }

    #[test]
    fn categories_insert_and_overwrite() {
        let mut state = TreantState::new("Sim", "run1");
        state
            .add_categories([("red", CategoryValue::from(1i64)), ("blue", CategoryValue::from(2i64))])
            .unwrap();
        state.add_categories([("red", CategoryValue::from("crimson"))]).unwrap();

        assert_eq!(state.categories["red"], CategoryValue::Text("crimson".to_string()));
        assert_eq!(state.categories["blue"], CategoryValue::Int(2));

        state.remove_categories(&["red"]);
        assert!(!state.categories.contains_key("red"));
    }

    #[test]
    fn non_finite_category_rejected() {
        let mut state = TreantState::new("Sim", "run1");
        let err = state
            .add_categories([("temp", CategoryValue::Float(f64::NAN))])
            .unwrap_err();
        assert!(matches!(err, SyncError::UserError(_)));
    }

    #[test]
    fn category_value_parsing() {
        assert_eq!("true".parse::<CategoryValue>().unwrap(), CategoryValue::Bool(true));
        assert_eq!("42".parse::<CategoryValue>().unwrap(), CategoryValue::Int(42));
        assert_eq!("300.5".parse::<CategoryValue>().unwrap(), CategoryValue::Float(300.5));
        assert_eq!(
            "inf".parse::<CategoryValue>().unwrap(),
            CategoryValue::Text("inf".to_string())
        );
        assert_eq!(
            "water".parse::<CategoryValue>().unwrap(),
            CategoryValue::Text("water".to_string())
        );
    }

    #[test]
    fn universe_lifecycle() {
        let mut state = TreantState::new("Sim", "run1");
        let (top, traj) = universe_paths();

        state.add_universe("main", top.clone(), traj.clone()).unwrap();
        state.add_selection("main", "CA", &["name CA"]).unwrap();
        state.set_default_universe(Some("main")).unwrap();

        state.rename_universe("main", "solvated").unwrap();
        assert_eq!(state.default_universe.as_deref(), Some("solvated"));
        assert_eq!(state.universes["solvated"].selections["CA"], vec!["name CA"]);

        // Redefining drops stored selections.
        state.add_universe("solvated", top, traj).unwrap();
        assert!(state.universes["solvated"].selections.is_empty());

        state.remove_universe("solvated").unwrap();
        assert!(state.default_universe.is_none());
        assert!(state.universes.is_empty());
    }

    #[test]
    fn missing_universe_is_user_error() {
        let mut state = TreantState::new("Sim", "run1");

        assert!(state.remove_universe("ghost").is_err());
        assert!(state.set_default_universe(Some("ghost")).is_err());
        assert!(state.add_selection("ghost", "CA", &["name CA"]).is_err());
        assert!(state.rename_universe("ghost", "other").is_err());
    }

    #[test]
    fn rename_onto_existing_universe_fails() {
        let mut state = TreantState::new("Sim", "run1");
        let (top, traj) = universe_paths();
        state.add_universe("a", top.clone(), traj.clone()).unwrap();
        state.add_universe("b", top, traj).unwrap();

        assert!(state.rename_universe("a", "b").is_err());
        assert!(state.universes.contains_key("a"));
    }

    #[test]
    fn remove_missing_selection_fails() {
        let mut state = TreantState::new("Sim", "run1");
        let (top, traj) = universe_paths();
        state.add_universe("main", top, traj).unwrap();

        assert!(state.remove_selection("main", "CA").is_err());
    }

    #[test]
    fn treant_schema_round_trips_full_state() {
        let schema = TreantSchema::new("Sim", "run1");
        let mut state = schema.default_cache();
        let (top, traj) = universe_paths();
        state.add_tags(&["little", "big"]).unwrap();
        state
            .add_categories([
                ("red", CategoryValue::from(1i64)),
                ("temperature", CategoryValue::from(300.0)),
                ("solvated", CategoryValue::from(true)),
            ])
            .unwrap();
        state.add_universe("main", top, traj).unwrap();
        state.add_selection("main", "protein", &["protein", "not name H*"]).unwrap();
        state.set_default_universe(Some("main")).unwrap();

        let bytes = schema.encode(&state).unwrap();
        assert_eq!(schema.decode(&bytes).unwrap(), state);
    }

    #[test]
    fn treant_schema_round_trips_awkward_floats() {
        let schema = TreantSchema::new("Sim", "run1");
        for value in [
            1.0715660391465826e-75,
            -1.81996730402717e-179,
            -1.603964615428183e143,
            -9.643915712060552e-234,
        ] {
            let mut state = schema.default_cache();
            state
                .add_categories([("temperature", CategoryValue::Float(value))])
                .unwrap();

            let bytes = schema.encode(&state).unwrap();
            assert_eq!(schema.decode(&bytes).unwrap(), state, "{:e}", value);
        }
    }

    #[test]
    fn treant_schema_default_uses_type_and_name() {
        let state = TreantSchema::new("Sim", "run1").default_cache();
        assert_eq!(state.treant_type, "Sim");
        assert_eq!(state.name, "run1");
        assert_eq!(state.version, env!("CARGO_PKG_VERSION"));
    }
}
