/*!
Accessibility semantics of page elements.

- `role.rs` - implicit ARIA roles and tag classification
- `inspector.rs` - [`accessibility_info`] and interactivity detection
*/

mod inspector;
mod role;

pub use inspector::{accessibility_info, is_interactive, resolve_idrefs};
pub use role::{implicit_role, is_landmark_role, is_natively_focusable, LANDMARK_TAGS};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// ARIA view of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AccessibilityInfo {
  /// Explicit `role` attribute, else the implicit role for the tag.
  pub role: Option<String>,
  /// `aria-label` attribute.
  pub aria_label: Option<String>,
  /// Text of the elements referenced by `aria-describedby`.
  pub aria_described_by: Option<String>,
  /// Text of the elements referenced by `aria-labelledby`.
  pub aria_labelled_by: Option<String>,
  /// Parsed `tabindex` attribute.
  pub tab_index: Option<i32>,
  /// Reachable by keyboard or pointer as a control.
  pub is_interactive: bool,
}
