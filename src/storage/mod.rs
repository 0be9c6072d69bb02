//! Key-value storage for the persisted filter selection.
//!
//! The host provides the real slot (the browser's local storage); this module
//! defines the [`FilterStorage`] seam plus two implementations:
//!
//! - [`MemoryStorage`]: in-process map with an optional byte quota, matching
//!   the failure mode of browser storage.
//! - [`FileStorage`]: a JSON object on disk for native hosts and tooling.
//!   Writes go through a temp file and rename.

pub mod codec;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;

use crate::error::FilterError;

pub use codec::{decode_terms, encode_terms};

/// A string-keyed slot store. Implementations use interior mutability so a
/// single handle can be shared across page sessions.
pub trait FilterStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, FilterError>;

    fn set(&self, key: &str, value: &str) -> Result<(), FilterError>;

    fn remove(&self, key: &str) -> Result<(), FilterError>;
}

/// In-memory slot store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes once keys plus values would exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Pre-populate a slot, e.g. with a value left by an older release.
    pub fn with_slot(self, key: &str, value: &str) -> Self {
        self.slots.lock().insert(key.to_string(), value.to_string());
        self
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.slots.lock().get(key).cloned()
    }
}

impl FilterStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, FilterError> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), FilterError> {
        let mut slots = self.slots.lock();
        if let Some(quota) = self.quota_bytes {
            let used: usize = slots
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = used + key.len() + value.len();
            if needed > quota {
                return Err(FilterError::StorageWrite(format!(
                    "quota exceeded ({needed} > {quota} bytes)"
                )));
            }
        }
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), FilterError> {
        self.slots.lock().remove(key);
        Ok(())
    }
}

/// JSON-file-backed slot store.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store under the platform data directory.
    pub fn open_default() -> Self {
        Self::new(Self::default_path())
    }

    /// Get path to the default storage file.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "bettercodex", "bettercodex").map_or_else(
            || PathBuf::from("bettercodex_storage.json"),
            |dirs| dirs.data_dir().join("storage.json"),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_slots(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", self.path.display()))
    }

    fn write_slots(&self, slots: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating storage directory {}", parent.display()))?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        let payload = serde_json::to_vec_pretty(slots).context("serializing storage slots")?;
        std::fs::write(&tmp_path, payload)
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), FilterError> {
        let _guard = self.write_lock.lock();
        let mut slots = self
            .read_slots()
            .map_err(|e| FilterError::StorageWrite(format!("{e:#}")))?;
        apply(&mut slots);
        self.write_slots(&slots)
            .map_err(|e| FilterError::StorageWrite(format!("{e:#}")))
    }
}

impl FilterStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, FilterError> {
        let slots = self
            .read_slots()
            .map_err(|e| FilterError::StorageRead(format!("{e:#}")))?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), FilterError> {
        self.update(|slots| {
            slots.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), FilterError> {
        self.update(|slots| {
            slots.remove(key);
        })
    }
}
