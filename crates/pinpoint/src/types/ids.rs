/*! Branded ID types for type-safe entity references. */

use derive_more::{Display, From, Into};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use ts_rs::TS;

/// Node identifier inside a [`crate::dom::Document`].
///
/// Ids are process-unique, so a handle kept across a reload never aliases a
/// node of the new document.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS, Display, From, Into,
)]
#[ts(export)]
pub struct NodeId(pub u32);

/// Global counter for `NodeId` generation. Starts at 1 (0 could be confused with "null").
static NODE_COUNTER: AtomicU32 = AtomicU32::new(1);

impl NodeId {
  /// Generate a new unique `NodeId`.
  pub fn new() -> Self {
    Self(NODE_COUNTER.fetch_add(1, Ordering::Relaxed))
  }
}

impl Default for NodeId {
  fn default() -> Self {
    Self::new()
  }
}

/// Annotation identifier: creation timestamp plus a random suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Display, From, Into)]
#[ts(export)]
pub struct AnnotationId(pub String);

const ID_SUFFIX_LEN: usize = 9;

impl AnnotationId {
  /// Generate an id for an annotation created at `timestamp_ms`.
  pub fn generate(timestamp_ms: i64) -> Self {
    let suffix: String = rand::thread_rng()
      .sample_iter(&Alphanumeric)
      .take(ID_SUFFIX_LEN)
      .map(char::from)
      .collect::<String>()
      .to_ascii_lowercase();
    Self(format!("{timestamp_ms}-{suffix}"))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for AnnotationId {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn node_ids_are_unique() {
    let a = NodeId::new();
    let b = NodeId::new();
    assert_ne!(a, b);
  }

  #[test]
  fn annotation_id_has_timestamp_prefix() {
    let id = AnnotationId::generate(1_700_000_000_000);
    assert!(id.as_str().starts_with("1700000000000-"));
    assert_eq!(id.as_str().len(), "1700000000000-".len() + ID_SUFFIX_LEN);
  }

  #[test]
  fn annotation_ids_do_not_collide_within_a_millisecond() {
    let ids: HashSet<_> = (0..500).map(|_| AnnotationId::generate(42)).collect();
    assert_eq!(ids.len(), 500);
  }
}
