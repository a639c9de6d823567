/*!
Core annotation lifecycle - owns the annotation set and event broadcasting.

# Module Structure

- `mod.rs` - `Annotator` struct, builder, events, persistence glue, settings
- `registry.rs` - Registry with private fields, dense numbering, event emission
- `lifecycle.rs` - add / update / delete / clear, reattach, marker anchoring
- `hooks.rs` - before-create hook contract

# Example

```ignore
let annotator = Annotator::builder()
    .origin("https://example.com")
    .storage(Arc::new(FileStorage::new("annotations.json")))
    .build();
annotator.load_persisted();
annotator.reattach(&document);

let mut events = annotator.subscribe();
let created = annotator.add(&document, node, "Too much padding", AddOptions::default()).await;
```
*/

mod hooks;
mod lifecycle;
mod registry;

pub use hooks::{BeforeCreateHook, CreatePayload, HookDecision};
pub use lifecycle::{AddOptions, AnnotationDraft};

use std::sync::Arc;
use std::time::Duration;

use async_broadcast::InactiveReceiver;
use parking_lot::RwLock;

use crate::persistence::{
  load_settings, save_settings, AnnotationStore, AutoSaver, Storage, DEFAULT_DEBOUNCE, DEFAULT_RETENTION,
};
use crate::types::{Annotation, AnnotationEvent, Settings, SettingsPatch, Snapshot};
use registry::Registry;

const EVENT_CHANNEL_CAPACITY: usize = 5000;
const DEFAULT_ORIGIN: &str = "default";

/// Current time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
  chrono::Utc::now().timestamp_millis()
}

struct Persistence {
  storage: Arc<dyn Storage>,
  autosave: AutoSaver,
}

/// The annotation lifecycle manager.
///
/// Clone is cheap (Arc bumps) and clones share state.
pub struct Annotator {
  state: Arc<RwLock<Registry>>,
  events_keepalive: InactiveReceiver<AnnotationEvent>,
  persistence: Option<Arc<Persistence>>,
  hook: Option<Arc<dyn BeforeCreateHook>>,
  origin: Arc<str>,
}

impl Clone for Annotator {
  fn clone(&self) -> Self {
    Self {
      state: Arc::clone(&self.state),
      events_keepalive: self.events_keepalive.clone(),
      persistence: self.persistence.clone(),
      hook: self.hook.clone(),
      origin: Arc::clone(&self.origin),
    }
  }
}

impl std::fmt::Debug for Annotator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Annotator")
      .field("origin", &self.origin)
      .finish_non_exhaustive()
  }
}

/// Builder for configuring an [`Annotator`].
#[must_use = "Builder does nothing until .build() is called"]
pub struct AnnotatorBuilder {
  origin: String,
  storage: Option<Arc<dyn Storage>>,
  settings: SettingsPatch,
  debounce: Duration,
  retention: Duration,
  event_channel_capacity: usize,
  hook: Option<Arc<dyn BeforeCreateHook>>,
}

impl Default for AnnotatorBuilder {
  fn default() -> Self {
    Self {
      origin: DEFAULT_ORIGIN.to_string(),
      storage: None,
      settings: SettingsPatch::default(),
      debounce: DEFAULT_DEBOUNCE,
      retention: DEFAULT_RETENTION,
      event_channel_capacity: EVENT_CHANNEL_CAPACITY,
      hook: None,
    }
  }
}

impl std::fmt::Debug for AnnotatorBuilder {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AnnotatorBuilder")
      .field("origin", &self.origin)
      .field("settings", &self.settings)
      .field("debounce", &self.debounce)
      .field("retention", &self.retention)
      .finish_non_exhaustive()
  }
}

impl AnnotatorBuilder {
  /// Page origin; annotations are stored per origin.
  pub fn origin(mut self, origin: impl Into<String>) -> Self {
    self.origin = origin.into();
    self
  }

  /// Enable persistence. Without storage the annotation set lives in memory only.
  pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
    self.storage = Some(storage);
    self
  }

  /// Explicit settings, applied over stored ones.
  pub fn settings(mut self, overrides: SettingsPatch) -> Self {
    self.settings = overrides;
    self
  }

  /// Auto-save debounce window. Default: 1000ms.
  pub const fn debounce(mut self, window: Duration) -> Self {
    self.debounce = window;
    self
  }

  /// How long stored annotations live. Default: 7 days.
  pub const fn retention(mut self, retention: Duration) -> Self {
    self.retention = retention;
    self
  }

  /// Default: 5000. Oldest events are dropped when full.
  pub const fn event_channel_capacity(mut self, capacity: usize) -> Self {
    self.event_channel_capacity = capacity;
    self
  }

  /// Install the hook consulted before every create.
  pub fn before_create(mut self, hook: impl BeforeCreateHook + 'static) -> Self {
    self.hook = Some(Arc::new(hook));
    self
  }

  /// Load stored settings (when persistent) and start the autosave worker.
  pub fn build(self) -> Annotator {
    let settings = self.storage.as_deref().map_or_else(
      || Settings::default().merged(&self.settings),
      |storage| load_settings(storage, &self.settings),
    );

    let (mut tx, rx) = async_broadcast::broadcast(self.event_channel_capacity.max(1));
    tx.set_overflow(true);

    let persistence = self.storage.map(|storage| {
      let store = AnnotationStore::new(Arc::clone(&storage), &self.origin).with_retention(self.retention);
      Arc::new(Persistence {
        storage,
        autosave: AutoSaver::new(Arc::new(store), self.debounce),
      })
    });

    log::debug!(
      "Annotator for {} (persistence {})",
      self.origin,
      if persistence.is_some() { "on" } else { "off" }
    );

    Annotator {
      state: Arc::new(RwLock::new(Registry::new(tx, settings))),
      events_keepalive: rx.deactivate(),
      persistence,
      hook: self.hook,
      origin: self.origin.into(),
    }
  }
}

impl Annotator {
  /// In-memory annotator with default settings.
  pub fn new() -> Self {
    Self::builder().build()
  }

  /// Configure persistence, settings and the before-create hook.
  pub fn builder() -> AnnotatorBuilder {
    AnnotatorBuilder::default()
  }

  /// Origin the annotations are stored under.
  pub fn origin(&self) -> &str {
    &self.origin
  }

  /// Subscribe to lifecycle events.
  pub fn subscribe(&self) -> async_broadcast::Receiver<AnnotationEvent> {
    self.events_keepalive.activate_cloned()
  }

  /// Read state. Never await or call the hook inside the closure.
  #[inline]
  fn read<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
    f(&self.state.read())
  }

  /// Write state. Never await or call the hook inside the closure.
  #[inline]
  fn write<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
    f(&mut self.state.write())
  }

  /// Annotations plus settings, as sent to a newly connected client.
  pub fn snapshot(&self) -> Snapshot {
    self.read(Registry::snapshot)
  }

  // === Settings ===

  /// Current settings.
  pub fn settings(&self) -> Settings {
    self.read(|s| s.settings().clone())
  }

  /// Apply `patch`, store the result and emit `SettingsChanged`.
  pub fn set_settings(&self, patch: &SettingsPatch) -> Settings {
    let settings = self.write(|s| {
      let merged = s.settings().clone().merged(patch);
      s.set_settings(merged)
    });
    if let Some(p) = &self.persistence {
      save_settings(&*p.storage, &settings);
    }
    settings
  }

  // === Persistence ===

  fn persists(&self) -> Option<&Persistence> {
    self
      .persistence
      .as_deref()
      .filter(|_| self.read(|s| s.settings().persist_annotations))
  }

  /// Queue a debounced save of the current set.
  fn schedule_save(&self) {
    if let Some(p) = self.persists() {
      let (revision, annotations) = self.read(Registry::versioned);
      p.autosave.schedule(revision, annotations);
    }
  }

  /// Replace the in-memory set with what storage holds for this origin.
  ///
  /// Handles start out empty; call [`Annotator::reattach`] once the page
  /// has rendered. Emits one `Loaded` event.
  pub fn load_persisted(&self) -> Vec<Annotation> {
    let Some(p) = self.persists() else {
      return Vec::new();
    };
    let stored = p.autosave.store().load();
    let loaded = self.write(|s| s.replace_all(stored));
    log::debug!("Loaded {} annotations for {}", loaded.len(), self.origin);
    loaded
  }

  /// Write any pending auto-save now. True if nothing failed.
  pub fn flush(&self) -> bool {
    self.persistence.as_ref().map_or(true, |p| p.autosave.flush())
  }
}

impl Default for Annotator {
  fn default() -> Self {
    Self::new()
  }
}
