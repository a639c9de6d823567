/*! `ElementInfo`: the immutable description of one element at one moment. */

use std::collections::BTreeMap;

use super::Bounds;
use crate::a11y::AccessibilityInfo;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Bounding rectangle in the shape the rendering layer expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ElementRect {
  pub top: f64,
  pub left: f64,
  pub width: f64,
  pub height: f64,
  pub right: f64,
  pub bottom: f64,
}

impl From<Bounds> for ElementRect {
  fn from(b: Bounds) -> Self {
    Self {
      top: b.y,
      left: b.x,
      width: b.w,
      height: b.h,
      right: b.right(),
      bottom: b.bottom(),
    }
  }
}

impl From<ElementRect> for Bounds {
  fn from(r: ElementRect) -> Self {
    Bounds::new(r.left, r.top, r.width, r.height)
  }
}

/// Human-readable descriptions of the element's surroundings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NearbyContext {
  pub parent: Option<String>,
  pub previous_sibling: Option<String>,
  pub next_sibling: Option<String>,
  pub containing_landmark: Option<String>,
}

/// Snapshot of everything known about an element.
///
/// Never mutated after collection; recollect to refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ElementInfo {
  pub human_readable: String,
  /// Short selector, unique at collection time when possible. Never empty.
  pub selector_path: String,
  /// Unbounded ancestor chain for forensic output.
  pub full_dom_path: String,
  pub component_path: Option<String>,
  pub component_framework: Option<String>,
  pub tag_name: String,
  pub id: Option<String>,
  /// Deduplicated, build-hash-stripped classes.
  pub classes: Vec<String>,
  pub rect: ElementRect,
  pub accessibility: AccessibilityInfo,
  /// Present only for forensic collection.
  pub computed_styles: Option<BTreeMap<String, String>>,
  pub nearby_context: NearbyContext,
  /// Truncated to 200 characters.
  pub inner_text: String,
  /// All attributes except `class`, `style` and `id`.
  pub attributes: BTreeMap<String, String>,
  pub is_fixed: bool,
}
