/*! Reads ARIA state off a [`Document`] element. */

use super::role::{implicit_role, is_natively_focusable};
use super::AccessibilityInfo;
use crate::dom::{collapse_whitespace, Document};
use crate::types::NodeId;

/// Tags that are interactive on their own.
const INTERACTIVE_TAGS: &[&str] = &["button", "select", "textarea", "summary", "details"];

/// Explicit roles that make any element interactive.
const INTERACTIVE_ROLES: &[&str] = &[
  "button",
  "link",
  "checkbox",
  "radio",
  "switch",
  "tab",
  "menuitem",
  "menuitemcheckbox",
  "menuitemradio",
  "option",
  "slider",
  "spinbutton",
  "textbox",
  "searchbox",
  "combobox",
];

fn input_type(doc: &Document, node: NodeId) -> Option<String> {
  doc
    .attribute(node, "type")
    .map(|t| t.trim().to_ascii_lowercase())
}

fn non_empty(value: Option<&str>) -> Option<String> {
  value
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(str::to_string)
}

/// Collect the ARIA view of `node`.
pub fn accessibility_info(doc: &Document, node: NodeId) -> AccessibilityInfo {
  let tag = doc.tag_name(node).unwrap_or_default();
  let input_type = input_type(doc, node);
  let has_href = doc.has_attribute(node, "href");

  let role = non_empty(doc.attribute(node, "role"))
    .or_else(|| implicit_role(tag, input_type.as_deref(), has_href).map(str::to_string));

  let tab_index = doc
    .attribute(node, "tabindex")
    .and_then(|t| t.trim().parse::<i32>().ok())
    .or_else(|| is_natively_focusable(tag, input_type.as_deref(), has_href).then_some(0));

  AccessibilityInfo {
    role,
    aria_label: non_empty(doc.attribute(node, "aria-label")),
    aria_described_by: doc
      .attribute(node, "aria-describedby")
      .and_then(|ids| resolve_idrefs(doc, ids)),
    aria_labelled_by: doc
      .attribute(node, "aria-labelledby")
      .and_then(|ids| resolve_idrefs(doc, ids)),
    tab_index,
    is_interactive: is_interactive(doc, node),
  }
}

/// Resolve a space-separated id list to the referenced elements' trimmed
/// text, joined with spaces. `None` if nothing resolves to text.
pub fn resolve_idrefs(doc: &Document, ids: &str) -> Option<String> {
  let parts: Vec<String> = ids
    .split_whitespace()
    .filter_map(|id| doc.get_element_by_id(id))
    .map(|el| collapse_whitespace(&doc.text_content(el)))
    .filter(|text| !text.is_empty())
    .collect();
  (!parts.is_empty()).then(|| parts.join(" "))
}

/// Interactive if it matches the interactive element list, carries a click
/// handler attribute, or shows a pointer cursor.
pub fn is_interactive(doc: &Document, node: NodeId) -> bool {
  let Some(tag) = doc.tag_name(node) else {
    return false;
  };

  let by_tag = match tag {
    "a" => doc.has_attribute(node, "href"),
    "input" => input_type(doc, node).as_deref() != Some("hidden"),
    _ => INTERACTIVE_TAGS.contains(&tag),
  };
  let by_role = doc
    .attribute(node, "role")
    .is_some_and(|r| INTERACTIVE_ROLES.contains(&r.trim()));
  let by_tabindex = doc
    .attribute(node, "tabindex")
    .and_then(|t| t.trim().parse::<i32>().ok())
    .is_some_and(|t| t >= 0);
  let by_editable = doc.attribute(node, "contenteditable").is_some_and(|v| v != "false");
  let by_handler = doc.has_attribute(node, "onclick") || doc.has_attribute(node, "data-onclick");
  let by_cursor = doc.computed_style(node, "cursor") == Some("pointer");

  by_tag || by_role || by_tabindex || by_editable || by_handler || by_cursor
}
