//! Local snapshot fallback.
//!
//! A string-keyed persistent map. Reports are kept under one key,
//! `"<namespace>-reports"`, whose value is a JSON object from report id to
//! document. Upserts through one [`LocalReports`] (and its clones) are
//! serialized; separate processes sharing the directory still race and the
//! last write wins.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use report_core::{Block, Document, ReportId, decode_blocks};

use crate::error::StoreResult;

/// A persistent string-keyed map.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// Key-value store with one `<key>.json` file per key.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// reader never sees a half-written value.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Uses `dir`, creating it on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        fs::create_dir_all(&self.dir)?;
        let target = self.path_for(key);
        let staging = self.dir.join(format!(".{}.tmp", Uuid::new_v4().simple()));
        fs::write(&staging, value)?;
        if let Err(e) = fs::rename(&staging, &target) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Key-value store held in memory.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// Report snapshot
// ============================================================================

/// Reports kept in a [`KeyValueStore`] under one namespaced key.
#[derive(Debug, Clone)]
pub struct LocalReports {
    kv: Arc<dyn KeyValueStore>,
    namespace: String,
    // Held across read-modify-write of the reports map.
    write_lock: Arc<Mutex<()>>,
}

impl LocalReports {
    pub fn new(kv: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            kv,
            namespace: namespace.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Snapshot held in memory only.
    pub fn in_memory(namespace: impl Into<String>) -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()), namespace)
    }

    /// Key of the id-to-document map.
    #[must_use]
    pub fn reports_key(&self) -> String {
        format!("{}-reports", self.namespace)
    }

    /// Key of the single-document snapshot older editors wrote.
    #[must_use]
    pub fn legacy_document_key(&self) -> String {
        format!("{}-document", self.namespace)
    }

    pub fn key_value_store(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    fn read_map(&self) -> StoreResult<Map<String, Value>> {
        match self.kv.get(&self.reports_key())? {
            None => Ok(Map::new()),
            Some(raw) => match serde_json::from_str::<Value>(&raw)? {
                Value::Object(map) => Ok(map),
                _ => {
                    tracing::warn!(key = %self.reports_key(), "Local report snapshot is not an object; ignoring it");
                    Ok(Map::new())
                }
            },
        }
    }

    fn decode(id: &str, value: Value) -> Option<Document> {
        match Document::deserialize(value) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(report_id = %id, error = %e, "Skipping undecodable local report");
                None
            }
        }
    }

    /// Fetches one report.
    pub fn get(&self, id: &ReportId) -> StoreResult<Option<Document>> {
        let mut map = self.read_map()?;
        Ok(map
            .remove(id.as_str())
            .and_then(|value| Self::decode(id.as_str(), value)))
    }

    /// Merges `doc` into the map, replacing any report with the same id.
    pub fn upsert(&self, doc: &Document) -> StoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map()?;
        map.insert(doc.id.0.clone(), serde_json::to_value(doc)?);
        let raw = serde_json::to_string(&Value::Object(map))?;
        self.kv.set(&self.reports_key(), &raw)
    }

    /// Every report in the snapshot.
    pub fn all(&self) -> StoreResult<Vec<Document>> {
        Ok(self
            .read_map()?
            .into_iter()
            .filter_map(|(id, value)| Self::decode(&id, value))
            .collect())
    }

    /// Blocks of the legacy single-document snapshot, if one exists.
    ///
    /// Accepts a bare block array or an object with a `blocks` array.
    pub fn legacy_blocks(&self) -> StoreResult<Option<Vec<Block>>> {
        let Some(raw) = self.kv.get(&self.legacy_document_key())? else {
            return Ok(None);
        };
        let blocks = match serde_json::from_str::<Value>(&raw)? {
            list @ Value::Array(_) => list,
            Value::Object(mut obj) => obj.remove("blocks").unwrap_or(Value::Null),
            _ => Value::Null,
        };
        if !blocks.is_array() {
            return Ok(None);
        }
        Ok(Some(decode_blocks(blocks)))
    }

    /// Writes a legacy single-document snapshot.
    pub fn set_legacy_blocks(&self, blocks: &[Block]) -> StoreResult<()> {
        let raw = serde_json::to_string(&serde_json::json!({ "blocks": blocks }))?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.kv.set(&self.legacy_document_key(), &raw)
    }
}
