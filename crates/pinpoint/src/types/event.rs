/*! Event types emitted by the annotation lifecycle. */

use super::{Annotation, AnnotationId, Settings};
use serde::Serialize;
use ts_rs::TS;

/// Initial state sent on connection.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct Snapshot {
  /// Sorted by display number.
  pub annotations: Vec<Annotation>,
  pub settings: Settings,
}

/// Events emitted when annotation state changes. One event per logical
/// operation.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(tag = "event", content = "data")]
#[ts(export)]
pub enum AnnotationEvent {
  #[serde(rename = "sync:init")]
  SyncInit(Snapshot),

  #[serde(rename = "annotation:created")]
  Created { annotation: Annotation },
  /// Multi-select: all annotations of one drag gesture.
  #[serde(rename = "annotations:created")]
  BatchCreated { annotations: Vec<Annotation> },
  #[serde(rename = "annotation:updated")]
  Updated { annotation: Annotation },
  /// `renumbered` lists annotations whose display number shifted down.
  #[serde(rename = "annotation:deleted")]
  Deleted {
    annotation: Annotation,
    renumbered: Vec<AnnotationId>,
  },
  #[serde(rename = "annotations:cleared")]
  Cleared { annotations: Vec<Annotation> },
  #[serde(rename = "annotations:loaded")]
  Loaded { annotations: Vec<Annotation> },
  /// Live element handles were re-acquired after a reload or navigation.
  #[serde(rename = "annotations:reattached")]
  Reattached { annotation_ids: Vec<AnnotationId> },

  #[serde(rename = "settings:changed")]
  SettingsChanged { settings: Settings },
}
