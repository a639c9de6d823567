/*!
Registry: the in-memory annotation set, the single source of truth.

All fields are private. Every mutation goes through a method that keeps the
numbering dense, bumps the revision and emits exactly one event.
*/

use std::collections::HashMap;

use async_broadcast::Sender;

use crate::types::{Annotation, AnnotationEvent, AnnotationId, ElementInfo, NodeId, Settings, Snapshot};

pub(crate) struct Registry {
  events_tx: Sender<AnnotationEvent>,
  annotations: HashMap<AnnotationId, Annotation>,
  settings: Settings,
  /// Bumped on every emitted event.
  revision: u64,
}

impl Registry {
  pub(crate) fn new(events_tx: Sender<AnnotationEvent>, settings: Settings) -> Self {
    Self {
      events_tx,
      annotations: HashMap::new(),
      settings,
      revision: 0,
    }
  }

  fn emit(&mut self, event: AnnotationEvent) {
    self.revision += 1;
    if let Err(e) = self.events_tx.try_broadcast(event) {
      if e.is_full() {
        log::error!("Event channel overflow - annotation events are being dropped.");
      }
    }
  }

  fn next_number(&self) -> u32 {
    self.annotations.values().map(|a| a.number).max().unwrap_or(0) + 1
  }

  // === Queries ===

  pub(crate) fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
    self.annotations.get(id)
  }

  pub(crate) fn len(&self) -> usize {
    self.annotations.len()
  }

  /// All annotations ordered by number.
  pub(crate) fn sorted(&self) -> Vec<Annotation> {
    let mut all: Vec<Annotation> = self.annotations.values().cloned().collect();
    all.sort_by_key(|a| a.number);
    all
  }

  /// Current revision with the set ordered by number, read together so the
  /// pair is consistent.
  pub(crate) fn versioned(&self) -> (u64, Vec<Annotation>) {
    (self.revision, self.sorted())
  }

  pub(crate) fn settings(&self) -> &Settings {
    &self.settings
  }

  pub(crate) fn snapshot(&self) -> Snapshot {
    Snapshot {
      annotations: self.sorted(),
      settings: self.settings.clone(),
    }
  }

  /// Annotations whose handle is missing or fails `is_live`.
  pub(crate) fn detached(&self, is_live: impl Fn(NodeId) -> bool) -> Vec<(AnnotationId, ElementInfo)> {
    self
      .annotations
      .values()
      .filter(|a| !a.element.is_some_and(&is_live))
      .map(|a| (a.id.clone(), a.element_info.clone()))
      .collect()
  }

  // === Mutations ===

  /// Commit a new annotation as number `max + 1`.
  pub(crate) fn insert(&mut self, mut annotation: Annotation) -> Annotation {
    annotation.number = self.next_number();
    self.annotations.insert(annotation.id.clone(), annotation.clone());
    self.emit(AnnotationEvent::Created {
      annotation: annotation.clone(),
    });
    annotation
  }

  /// Commit several annotations with consecutive numbers and one event.
  pub(crate) fn insert_batch(&mut self, batch: Vec<Annotation>) -> Vec<Annotation> {
    let first = self.next_number();
    let committed: Vec<Annotation> = batch
      .into_iter()
      .zip(first..)
      .map(|(mut a, number)| {
        a.number = number;
        a
      })
      .collect();
    for a in &committed {
      self.annotations.insert(a.id.clone(), a.clone());
    }
    self.emit(AnnotationEvent::BatchCreated {
      annotations: committed.clone(),
    });
    committed
  }

  fn modify(&mut self, id: &AnnotationId, f: impl FnOnce(&mut Annotation)) -> Option<Annotation> {
    let annotation = self.annotations.get_mut(id)?;
    f(annotation);
    let updated = annotation.clone();
    self.emit(AnnotationEvent::Updated {
      annotation: updated.clone(),
    });
    Some(updated)
  }

  pub(crate) fn update_comment(&mut self, id: &AnnotationId, comment: String, now: i64) -> Option<Annotation> {
    self.modify(id, |a| {
      a.comment = comment;
      a.updated_at = now;
    })
  }

  pub(crate) fn update_element_info(&mut self, id: &AnnotationId, info: ElementInfo, now: i64) -> Option<Annotation> {
    self.modify(id, |a| {
      a.element_info = info;
      a.updated_at = now;
    })
  }

  /// Remove one annotation and close the gap in numbering.
  pub(crate) fn remove(&mut self, id: &AnnotationId) -> Option<Annotation> {
    let removed = self.annotations.remove(id)?;

    let mut renumbered = Vec::new();
    for a in self.annotations.values_mut() {
      if a.number > removed.number {
        a.number -= 1;
        renumbered.push(a.id.clone());
      }
    }

    self.emit(AnnotationEvent::Deleted {
      annotation: removed.clone(),
      renumbered,
    });
    Some(removed)
  }

  pub(crate) fn clear(&mut self) -> Vec<Annotation> {
    let cleared = self.sorted();
    self.annotations.clear();
    self.emit(AnnotationEvent::Cleared {
      annotations: cleared.clone(),
    });
    cleared
  }

  /// Replace the set with `loaded`, renumbering densely in stored order.
  pub(crate) fn replace_all(&mut self, mut loaded: Vec<Annotation>) -> Vec<Annotation> {
    loaded.sort_by_key(|a| a.number);
    for (a, number) in loaded.iter_mut().zip(1..) {
      a.number = number;
    }
    self.annotations = loaded.iter().map(|a| (a.id.clone(), a.clone())).collect();
    self.emit(AnnotationEvent::Loaded {
      annotations: loaded.clone(),
    });
    loaded
  }

  /// Attach live handles. Emits only if something was attached.
  pub(crate) fn attach(&mut self, found: Vec<(AnnotationId, NodeId)>) -> usize {
    let mut annotation_ids = Vec::new();
    for (id, node) in found {
      if let Some(a) = self.annotations.get_mut(&id) {
        a.element = Some(node);
        annotation_ids.push(id);
      }
    }
    let count = annotation_ids.len();
    if count > 0 {
      self.emit(AnnotationEvent::Reattached { annotation_ids });
    }
    count
  }

  pub(crate) fn set_settings(&mut self, settings: Settings) -> Settings {
    self.settings = settings.clone();
    self.emit(AnnotationEvent::SettingsChanged {
      settings: settings.clone(),
    });
    settings
  }
}
