/*! Key/value storage backends. */

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::types::{PinpointError, PinpointResult};

/// String key/value storage with `localStorage` semantics.
pub trait Storage: Send + Sync {
  /// Value under `key`, `None` if absent.
  fn get(&self, key: &str) -> PinpointResult<Option<String>>;
  /// Store `value`, replacing any previous one. Fails with
  /// [`PinpointError::QuotaExceeded`] when the backend is full.
  fn set(&self, key: &str, value: &str) -> PinpointResult<()>;
  /// Delete `key`. Removing a missing key is not an error.
  fn remove(&self, key: &str) -> PinpointResult<()>;
  /// Every key currently stored, in no particular order.
  fn keys(&self) -> PinpointResult<Vec<String>>;
}

/// In-process storage with an optional byte quota over keys plus values.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  entries: Mutex<BTreeMap<String, String>>,
  quota: Option<usize>,
}

impl MemoryStorage {
  /// Unbounded storage.
  pub fn new() -> Self {
    Self::default()
  }

  /// Storage that rejects writes once keys plus values exceed `bytes`.
  pub fn with_quota(bytes: usize) -> Self {
    Self {
      entries: Mutex::default(),
      quota: Some(bytes),
    }
  }

  /// Number of stored keys.
  pub fn len(&self) -> usize {
    self.entries.lock().len()
  }

  /// True when nothing is stored.
  pub fn is_empty(&self) -> bool {
    self.entries.lock().is_empty()
  }
}

impl Storage for MemoryStorage {
  fn get(&self, key: &str) -> PinpointResult<Option<String>> {
    Ok(self.entries.lock().get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> PinpointResult<()> {
    let mut entries = self.entries.lock();
    if let Some(quota) = self.quota {
      let used: usize = entries
        .iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| k.len() + v.len())
        .sum();
      let available = quota.saturating_sub(used);
      let needed = key.len() + value.len();
      if needed > available {
        return Err(PinpointError::QuotaExceeded {
          key: key.to_string(),
          needed,
          available,
        });
      }
    }
    entries.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> PinpointResult<()> {
    self.entries.lock().remove(key);
    Ok(())
  }

  fn keys(&self) -> PinpointResult<Vec<String>> {
    Ok(self.entries.lock().keys().cloned().collect())
  }
}

/// Storage backed by a single JSON object file (`{"key": "value", ...}`).
///
/// A missing file reads as empty. Writes go through a sibling temp file and a
/// rename so a crash never leaves a half-written object behind.
#[derive(Debug)]
pub struct FileStorage {
  path: PathBuf,
  lock: Mutex<()>,
}

impl FileStorage {
  /// Storage in `path`. The file is created on first write.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      lock: Mutex::new(()),
    }
  }

  /// Backing file.
  pub fn path(&self) -> &Path {
    &self.path
  }

  fn read_all(&self) -> PinpointResult<BTreeMap<String, String>> {
    match fs::read_to_string(&self.path) {
      Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
      Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
        PinpointError::Storage(format!("{} is not a JSON object of strings: {e}", self.path.display()))
      }),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
      Err(e) => Err(e.into()),
    }
  }

  fn write_all(&self, entries: &BTreeMap<String, String>) -> PinpointResult<()> {
    let tmp = self.path.with_extension("tmp");
    fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
    fs::rename(&tmp, &self.path)?;
    Ok(())
  }

  fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> PinpointResult<()> {
    let _guard = self.lock.lock();
    let mut entries = self.read_all()?;
    f(&mut entries);
    self.write_all(&entries)
  }
}

impl Storage for FileStorage {
  fn get(&self, key: &str) -> PinpointResult<Option<String>> {
    let _guard = self.lock.lock();
    Ok(self.read_all()?.remove(key))
  }

  fn set(&self, key: &str, value: &str) -> PinpointResult<()> {
    self.modify(|entries| {
      entries.insert(key.to_string(), value.to_string());
    })
  }

  fn remove(&self, key: &str) -> PinpointResult<()> {
    self.modify(|entries| {
      entries.remove(key);
    })
  }

  fn keys(&self) -> PinpointResult<Vec<String>> {
    let _guard = self.lock.lock();
    Ok(self.read_all()?.into_keys().collect())
  }
}
