/*!
Per-origin annotation storage with a retention window.

Each origin's annotations live under `annotation-annotations-<origin>` as a
JSON array. Loading is tolerant: a malformed blob reads as empty, invalid
entries are dropped one by one, and expired entries are filtered out. Whenever
loading drops anything the compacted list is written back.
*/

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::Storage;
use crate::fallible::{succeeded, swallow};
use crate::types::{Annotation, PinpointError, PinpointResult};

/// Prefix of per-origin annotation keys.
pub const ANNOTATIONS_KEY_PREFIX: &str = "annotation-annotations-";

/// Seven days.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Key the annotations of `origin` are stored under.
pub fn storage_key(origin: &str) -> String {
  format!("{ANNOTATIONS_KEY_PREFIX}{origin}")
}

/// Oldest `created_at` (ms) still inside the retention window.
fn cutoff_ms(now_ms: i64, retention: Duration) -> i64 {
  chrono::Duration::from_std(retention).map_or(i64::MIN, |window| {
    now_ms.saturating_sub(window.num_milliseconds())
  })
}

/// Outcome of parsing one stored blob.
struct Parsed {
  kept: Vec<Annotation>,
  invalid: usize,
  expired: usize,
}

impl Parsed {
  const fn dropped(&self) -> usize {
    self.invalid + self.expired
  }
}

fn parse(raw: &str, cutoff: i64) -> PinpointResult<Parsed> {
  let Value::Array(entries) = serde_json::from_str::<Value>(raw)? else {
    return Err(PinpointError::Serialization("stored annotations are not an array".to_string()));
  };

  let mut parsed = Parsed {
    kept: Vec::with_capacity(entries.len()),
    invalid: 0,
    expired: 0,
  };
  for entry in entries {
    match serde_json::from_value::<Annotation>(entry) {
      Ok(a) if a.created_at < cutoff => parsed.expired += 1,
      Ok(a) => parsed.kept.push(a),
      Err(e) => {
        log::warn!("Dropping invalid stored annotation: {e}");
        parsed.invalid += 1;
      }
    }
  }
  Ok(parsed)
}

fn write(storage: &dyn Storage, key: &str, annotations: &[Annotation]) -> PinpointResult<()> {
  let json = serde_json::to_string(annotations)?;
  storage.set(key, &json)
}

/// Annotation persistence for one origin.
pub struct AnnotationStore {
  storage: Arc<dyn Storage>,
  key: String,
  retention: Duration,
}

impl std::fmt::Debug for AnnotationStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AnnotationStore")
      .field("key", &self.key)
      .field("retention", &self.retention)
      .finish_non_exhaustive()
  }
}

impl AnnotationStore {
  /// Store for `origin` with [`DEFAULT_RETENTION`].
  pub fn new(storage: Arc<dyn Storage>, origin: &str) -> Self {
    Self {
      storage,
      key: storage_key(origin),
      retention: DEFAULT_RETENTION,
    }
  }

  /// Override how long loaded annotations stay valid.
  #[must_use]
  pub const fn with_retention(mut self, retention: Duration) -> Self {
    self.retention = retention;
    self
  }

  /// Storage key this store writes.
  pub fn key(&self) -> &str {
    &self.key
  }

  /// Backend shared with settings.
  pub fn storage(&self) -> &Arc<dyn Storage> {
    &self.storage
  }

  /// Write the full set. Live element handles are never persisted.
  pub fn save(&self, annotations: &[Annotation]) -> bool {
    let ok = succeeded("save annotations", write(&*self.storage, &self.key, annotations));
    if ok {
      log::debug!("Saved {} annotations to {}", annotations.len(), self.key);
    }
    ok
  }

  /// Load the stored set as of now.
  pub fn load(&self) -> Vec<Annotation> {
    self.load_at(crate::now_ms())
  }

  /// Load the stored set as of `now_ms`, sorted by number, with `element: None`.
  pub fn load_at(&self, now_ms: i64) -> Vec<Annotation> {
    let Some(raw) = swallow("load annotations", self.storage.get(&self.key)).flatten() else {
      return Vec::new();
    };
    if raw.trim().is_empty() {
      return Vec::new();
    }

    let Some(parsed) = swallow("load annotations", parse(&raw, cutoff_ms(now_ms, self.retention))) else {
      return Vec::new();
    };

    if parsed.dropped() > 0 {
      log::debug!(
        "Compacting {}: {} expired, {} invalid",
        self.key,
        parsed.expired,
        parsed.invalid
      );
      self.save(&parsed.kept);
    }

    let mut annotations = parsed.kept;
    for a in &mut annotations {
      a.element = None;
    }
    annotations.sort_by_key(|a| a.number);
    annotations
  }

  /// Remove the stored set. False (logged) on failure.
  pub fn clear(&self) -> bool {
    succeeded("clear annotations", self.storage.remove(&self.key))
  }
}

/// Apply the retention window to every origin's annotations.
///
/// Returns how many entries were removed. Keys whose blob cannot be parsed
/// are left alone.
pub fn sweep_expired(storage: &dyn Storage, now_ms: i64, retention: Duration) -> usize {
  let Some(keys) = swallow("sweep expired", storage.keys()) else {
    return 0;
  };
  let cutoff = cutoff_ms(now_ms, retention);

  let mut removed = 0;
  for key in keys.iter().filter(|k| k.starts_with(ANNOTATIONS_KEY_PREFIX)) {
    let Some(Some(raw)) = swallow("sweep expired", storage.get(key)) else {
      continue;
    };
    let Some(parsed) = swallow("sweep expired", parse(&raw, cutoff)) else {
      continue;
    };
    if parsed.expired == 0 {
      continue;
    }

    let written = if parsed.kept.is_empty() {
      storage.remove(key)
    } else {
      write(storage, key, &parsed.kept)
    };
    if succeeded("sweep expired", written) {
      removed += parsed.expired;
    }
  }

  if removed > 0 {
    log::debug!("Retention sweep removed {removed} annotations");
  }
  removed
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::persistence::MemoryStorage;
  use crate::types::testing::annotation;
  use crate::types::NodeId;

  const DAY_MS: i64 = 24 * 60 * 60 * 1000;
  const NOW: i64 = 1_700_000_000_000;

  fn store() -> (Arc<MemoryStorage>, AnnotationStore) {
    let storage = Arc::new(MemoryStorage::new());
    let store = AnnotationStore::new(storage.clone(), "https://example.com");
    (storage, store)
  }

  mod round_trip {
    use super::*;

    #[test]
    fn load_returns_what_was_saved_without_handles() {
      let (_, store) = store();
      let mut saved = vec![annotation(1, NOW - DAY_MS), annotation(2, NOW)];
      saved[0].element = Some(NodeId::new());
      assert!(store.save(&saved));

      let loaded = store.load_at(NOW);
      let expected: Vec<_> = saved.iter().map(Annotation::detached).collect();
      assert_eq!(loaded, expected);
    }

    #[test]
    fn key_is_per_origin() {
      let (storage, store) = store();
      store.save(&[annotation(1, NOW)]);
      assert_eq!(store.key(), "annotation-annotations-https://example.com");
      assert!(storage.get(store.key()).unwrap().is_some());
    }

    #[test]
    fn context_survives() {
      let (_, store) = store();
      let mut a = annotation(1, NOW);
      a.context = Some([("ticket".to_string(), serde_json::json!("ABC-1"))].into());
      store.save(&[a.clone()]);
      assert_eq!(store.load_at(NOW)[0].context, a.context);
    }
  }

  mod tolerant_load {
    use super::*;

    #[test]
    fn missing_or_malformed_is_empty() {
      let (storage, store) = store();
      assert!(store.load_at(NOW).is_empty());
      storage.set(store.key(), "{not json").unwrap();
      assert!(store.load_at(NOW).is_empty());
      storage.set(store.key(), r#"{"an": "object"}"#).unwrap();
      assert!(store.load_at(NOW).is_empty());
    }

    #[test]
    fn invalid_entries_are_dropped_and_compacted() {
      let (storage, store) = store();
      let good = serde_json::to_value(annotation(1, NOW)).unwrap();
      let blob = serde_json::json!([good, {"id": "x"}, 42]).to_string();
      storage.set(store.key(), &blob).unwrap();

      assert_eq!(store.load_at(NOW).len(), 1);
      let rewritten: Vec<Value> = serde_json::from_str(&storage.get(store.key()).unwrap().unwrap()).unwrap();
      assert_eq!(rewritten.len(), 1);
    }

    #[test]
    fn expired_entries_are_filtered_and_compacted() {
      let (storage, store) = store();
      store.save(&[annotation(1, NOW - 8 * DAY_MS), annotation(2, NOW - 6 * DAY_MS)]);

      let loaded = store.load_at(NOW);
      assert_eq!(loaded.len(), 1);
      assert_eq!(loaded[0].number, 2);

      let raw = storage.get(store.key()).unwrap().unwrap();
      let rewritten: Vec<Annotation> = serde_json::from_str(&raw).unwrap();
      assert_eq!(rewritten.len(), 1);
    }

    #[test]
    fn custom_retention() {
      let (storage, _) = store();
      let store = AnnotationStore::new(storage, "o").with_retention(Duration::from_secs(60));
      store.save(&[annotation(1, NOW - 61_000), annotation(2, NOW - 59_000)]);
      assert_eq!(store.load_at(NOW).len(), 1);
    }
  }

  mod save_failures {
    use super::*;

    #[test]
    fn quota_exceeded_returns_false() {
      let storage = Arc::new(MemoryStorage::with_quota(64));
      let store = AnnotationStore::new(storage.clone(), "o");
      assert!(!store.save(&[annotation(1, NOW)]));
      assert!(storage.is_empty());
    }
  }

  mod sweep {
    use super::*;

    fn seeded() -> MemoryStorage {
      let storage = MemoryStorage::new();
      let put = |origin: &str, list: &[Annotation]| {
        storage.set(&storage_key(origin), &serde_json::to_string(list).unwrap()).unwrap();
      };
      put("a", &[annotation(1, NOW - 10 * DAY_MS), annotation(2, NOW)]);
      put("b", &[annotation(1, NOW - 9 * DAY_MS)]);
      put("c", &[annotation(1, NOW)]);
      storage.set("annotation-settings", "{}").unwrap();
      storage.set(&storage_key("broken"), "nope").unwrap();
      storage
    }

    #[test]
    fn removes_expired_across_origins() {
      let storage = seeded();
      assert_eq!(sweep_expired(&storage, NOW, DEFAULT_RETENTION), 2);
      assert_eq!(storage.get(&storage_key("b")).unwrap(), None);
      assert!(storage.get("annotation-settings").unwrap().is_some());
      assert_eq!(storage.get(&storage_key("broken")).unwrap().as_deref(), Some("nope"));
    }

    #[test]
    fn second_sweep_removes_nothing() {
      let storage = seeded();
      sweep_expired(&storage, NOW, DEFAULT_RETENTION);
      assert_eq!(sweep_expired(&storage, NOW, DEFAULT_RETENTION), 0);
    }
  }
}
