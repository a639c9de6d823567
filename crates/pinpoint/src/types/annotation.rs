/*! Annotation type: a comment bound to one page element. */

use std::collections::BTreeMap;

use super::{AnnotationId, ElementInfo, NodeId};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Opaque metadata attached by the before-create hook.
pub type AnnotationContext = BTreeMap<String, serde_json::Value>;

/// A user comment bound to one element.
///
/// `number` is display-only and dense across the live set (1..=N).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Annotation {
  pub id: AnnotationId,
  pub number: u32,
  pub comment: String,
  pub element_info: ElementInfo,
  /// Lookup handle into the live document. Never persisted; `None` after a
  /// reload until the refinder reattaches it. Check `is_connected` before use.
  #[serde(skip)]
  #[ts(skip)]
  pub element: Option<NodeId>,
  /// Milliseconds since the Unix epoch.
  pub created_at: i64,
  pub updated_at: i64,
  #[serde(default)]
  pub selected_text: Option<String>,
  #[serde(default)]
  pub is_multi_select: bool,
  /// Document-absolute for regular elements, viewport-relative when
  /// `element_info.is_fixed`.
  pub click_x: f64,
  pub click_y: f64,
  /// Fractional position inside the element box at creation, in `[0, 1]`.
  pub offset_x: f64,
  pub offset_y: f64,
  /// Set by the before-create hook. Omitted from JSON when absent.
  #[serde(default)]
  #[serde(skip_serializing_if = "Option::is_none")]
  #[ts(optional)]
  pub context: Option<AnnotationContext>,
}

impl Annotation {
  /// Copy without the live element handle, as it would come back from storage.
  pub fn detached(&self) -> Self {
    Self {
      element: None,
      ..self.clone()
    }
  }
}
