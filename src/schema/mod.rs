//! Record schemas: how a cache is encoded to and decoded from bytes.
//!
//! The synchronization layer never interprets a cache. It only needs a way to
//! decode persisted bytes, encode a cache, build the default value for a new
//! record, and compare two caches for equality.

pub mod treant;

use crate::error::{Result, SyncError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;

pub use treant::{CategoryValue, PathPair, TreantSchema, TreantState, Universe};

/// Layout of one kind of record.
///
/// `decode(encode(c))` must equal `c`; the layer relies on this to verify
/// every write before releasing its lock.
pub trait Schema {
    /// In-memory representation of the record.
    type Cache: Clone + PartialEq + fmt::Debug;

    /// Parse persisted bytes. Failures are `SyncError::Corrupt`.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Cache>;

    /// Serialize a cache for persistence.
    fn encode(&self, cache: &Self::Cache) -> Result<Vec<u8>>;

    /// The value a brand new record starts with.
    fn default_cache(&self) -> Self::Cache;
}

/// A schema assembled from three closures.
pub struct FnSchema<C, R, W, D> {
    reader: R,
    writer: W,
    default: D,
    _cache: PhantomData<fn() -> C>,
}

impl<C, R, W, D> FnSchema<C, R, W, D>
where
    R: Fn(&[u8]) -> std::result::Result<C, String>,
    W: Fn(&C) -> std::result::Result<Vec<u8>, String>,
    D: Fn() -> C,
{
    pub fn new(reader: R, writer: W, default: D) -> Self {
        Self {
            reader,
            writer,
            default,
            _cache: PhantomData,
        }
    }
}

impl<C, R, W, D> Schema for FnSchema<C, R, W, D>
where
    C: Clone + PartialEq + fmt::Debug,
    R: Fn(&[u8]) -> std::result::Result<C, String>,
    W: Fn(&C) -> std::result::Result<Vec<u8>, String>,
    D: Fn() -> C,
{
    type Cache = C;

    fn decode(&self, bytes: &[u8]) -> Result<C> {
        (self.reader)(bytes).map_err(SyncError::Corrupt)
    }

    fn encode(&self, cache: &C) -> Result<Vec<u8>> {
        (self.writer)(cache)
            .map_err(|e| SyncError::Corrupt(format!("failed to encode record: {}", e)))
    }

    fn default_cache(&self) -> C {
        (self.default)()
    }
}

impl<C, R, W, D> fmt::Debug for FnSchema<C, R, W, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSchema").finish_non_exhaustive()
    }
}

/// Pretty-printed JSON records of any serde type.
pub struct JsonSchema<T> {
    _cache: PhantomData<fn() -> T>,
}

impl<T> JsonSchema<T> {
    pub fn new() -> Self {
        Self {
            _cache: PhantomData,
        }
    }
}

impl<T> Default for JsonSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonSchema")
    }
}

impl<T> Schema for JsonSchema<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + PartialEq + fmt::Debug,
{
    type Cache = T;

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes)
            .map_err(|e| SyncError::Corrupt(format!("invalid JSON record: {}", e)))
    }

    fn encode(&self, cache: &T) -> Result<Vec<u8>> {
        encode_json(cache)
    }

    fn default_cache(&self) -> T {
        T::default()
    }
}

/// YAML records of any serde type.
pub struct YamlSchema<T> {
    _cache: PhantomData<fn() -> T>,
}

impl<T> YamlSchema<T> {
    pub fn new() -> Self {
        Self {
            _cache: PhantomData,
        }
    }
}

impl<T> Default for YamlSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for YamlSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("YamlSchema")
    }
}

impl<T> Schema for YamlSchema<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + PartialEq + fmt::Debug,
{
    type Cache = T;

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        serde_yaml::from_slice(bytes)
            .map_err(|e| SyncError::Corrupt(format!("invalid YAML record: {}", e)))
    }

    fn encode(&self, cache: &T) -> Result<Vec<u8>> {
        serde_yaml::to_string(cache)
            .map(String::into_bytes)
            .map_err(|e| SyncError::Corrupt(format!("failed to encode record as YAML: {}", e)))
    }

    fn default_cache(&self) -> T {
        T::default()
    }
}

pub(crate) fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| SyncError::Corrupt(format!("failed to encode record as JSON: {}", e)))?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        tags: Vec<String>,
        categories: BTreeMap<String, i64>,
    }

    fn sample() -> Doc {
        Doc {
            name: "TestFile".to_string(),
            tags: vec!["little".to_string(), "big".to_string()],
            categories: BTreeMap::from([("red".to_string(), 1), ("blue".to_string(), 2)]),
        }
    }

    #[test]
    fn json_schema_round_trips() {
        let schema = JsonSchema::<Doc>::new();
        let bytes = schema.encode(&sample()).unwrap();

        assert!(bytes.ends_with(b"\n"));
        assert_eq!(schema.decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn yaml_schema_round_trips() {
        let schema = YamlSchema::<Doc>::new();
        let bytes = schema.encode(&sample()).unwrap();

        assert!(String::from_utf8(bytes.clone()).unwrap().contains("name: TestFile"));
        assert_eq!(schema.decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn json_schema_reports_corruption() {
        let schema = JsonSchema::<Doc>::new();
        let err = schema.decode(b"{\"name\": ").unwrap_err();
        assert!(matches!(err, SyncError::Corrupt(_)));
    }

    #[test]
    fn default_cache_uses_default_impl() {
        assert_eq!(JsonSchema::<Doc>::new().default_cache(), Doc::default());
        assert_eq!(YamlSchema::<Doc>::new().default_cache(), Doc::default());
    }

    #[test]
    fn fn_schema_delegates_to_closures() {
        let schema = FnSchema::new(
            |bytes: &[u8]| {
                std::str::from_utf8(bytes)
                    .map_err(|e| e.to_string())?
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| e.to_string())
            },
            |n: &u64| Ok::<_, String>(format!("{}\n", n).into_bytes()),
            || 0u64,
        );

        assert_eq!(schema.default_cache(), 0);
        assert_eq!(schema.encode(&42).unwrap(), b"42\n");
        assert_eq!(schema.decode(b"42\n").unwrap(), 42);
        assert!(matches!(schema.decode(b"forty"), Err(SyncError::Corrupt(_))));
    }
}
