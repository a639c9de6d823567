/*!
Computed-style extraction.

Selects a property whitelist per element category and keeps only values that
deviate from browser defaults, so exports show what is actually styled.
*/

use std::collections::BTreeMap;

use crate::dom::{default_display, Document};
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Coarse element kind used to pick style properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ElementCategory {
  /// Headings, paragraphs, labels and inline text.
  Text,
  /// Buttons, links and their ARIA equivalents.
  Button,
  /// Form controls and their ARIA equivalents.
  Input,
  /// Images, media, canvas and frames.
  Media,
  /// Everything else.
  Container,
}

const CONTEXTUAL_TEXT: &[&str] = &["color", "font-size", "font-weight", "font-family", "line-height", "text-align"];
const CONTEXTUAL_BUTTON: &[&str] = &["background-color", "color", "padding", "border-radius", "font-size", "font-weight"];
const CONTEXTUAL_INPUT: &[&str] = &["background-color", "color", "border", "border-radius", "padding", "font-size"];
const CONTEXTUAL_MEDIA: &[&str] = &["width", "height", "object-fit", "border-radius"];
const CONTEXTUAL_CONTAINER: &[&str] = &["display", "padding", "margin", "background-color", "gap", "flex-direction"];

const FORENSIC_COMMON: &[&str] = &[
  "display", "position", "top", "right", "bottom", "left", "width", "height", "margin", "padding",
  "color", "background-color", "border", "border-radius", "box-shadow", "opacity", "z-index",
  "overflow", "visibility", "transform", "cursor", "pointer-events",
];
const FORENSIC_TEXT: &[&str] = &[
  "font-family", "font-size", "font-weight", "line-height", "letter-spacing", "text-align",
  "text-decoration", "text-transform", "white-space",
];
const FORENSIC_BUTTON: &[&str] = &["font-size", "font-weight", "text-decoration", "transition", "outline"];
const FORENSIC_INPUT: &[&str] = &["font-size", "outline", "appearance", "caret-color"];
const FORENSIC_MEDIA: &[&str] = &["object-fit", "object-position", "aspect-ratio", "filter"];
const FORENSIC_CONTAINER: &[&str] = &[
  "flex-direction", "flex-wrap", "justify-content", "align-items", "gap", "grid-template-columns",
];

/// Values that never carry information, compared with whitespace removed.
const MEANINGLESS_VALUES: &[&str] = &[
  "", "none", "auto", "normal", "0", "0px", "0s", "0%", "transparent", "static", "visible",
  "initial", "inherit", "unset", "rgba(0,0,0,0)", "0pxnonergb(0,0,0)", "matrix(1,0,0,1,0,0)",
];

/// Per-property browser defaults.
const PROPERTY_DEFAULTS: &[(&str, &str)] = &[
  ("opacity", "1"),
  ("font-weight", "400"),
  ("text-align", "start"),
  ("flex-direction", "row"),
  ("flex-wrap", "nowrap"),
  ("justify-content", "flex-start"),
  ("object-fit", "fill"),
  ("object-position", "50%50%"),
];

impl ElementCategory {
  fn contextual_properties(self) -> &'static [&'static str] {
    match self {
      Self::Text => CONTEXTUAL_TEXT,
      Self::Button => CONTEXTUAL_BUTTON,
      Self::Input => CONTEXTUAL_INPUT,
      Self::Media => CONTEXTUAL_MEDIA,
      Self::Container => CONTEXTUAL_CONTAINER,
    }
  }

  fn forensic_extras(self) -> &'static [&'static str] {
    match self {
      Self::Text => FORENSIC_TEXT,
      Self::Button => FORENSIC_BUTTON,
      Self::Input => FORENSIC_INPUT,
      Self::Media => FORENSIC_MEDIA,
      Self::Container => FORENSIC_CONTAINER,
    }
  }
}

/// Category of an element, following the same tag/role order as labeling.
pub fn category(doc: &Document, node: NodeId) -> ElementCategory {
  let role = doc.attribute(node, "role").map(str::trim);
  match (doc.tag_name(node).unwrap_or_default(), role) {
    (_, Some("button" | "link" | "menuitem" | "tab")) | ("button" | "a", _) => ElementCategory::Button,
    (_, Some("textbox" | "searchbox" | "combobox" | "checkbox" | "radio" | "slider"))
    | ("input" | "select" | "textarea", _) => ElementCategory::Input,
    (
      "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "span" | "code" | "pre" | "blockquote" | "label"
      | "strong" | "em" | "small",
      _,
    ) => ElementCategory::Text,
    ("img" | "svg" | "video" | "audio" | "canvas" | "iframe" | "picture", _) => ElementCategory::Media,
    _ => ElementCategory::Container,
  }
}

fn squash(value: &str) -> String {
  value
    .chars()
    .filter(|c| !c.is_whitespace())
    .collect::<String>()
    .to_ascii_lowercase()
}

/// Does `value` for `property` deviate from what the browser would show
/// anyway on a `tag` element?
pub fn is_meaningful(tag: &str, property: &str, value: &str) -> bool {
  let squashed = squash(value);
  if MEANINGLESS_VALUES.contains(&squashed.as_str()) {
    return false;
  }
  if property == "display" && squashed == default_display(tag) {
    return false;
  }
  !PROPERTY_DEFAULTS
    .iter()
    .any(|&(p, default)| p == property && default == squashed)
}

fn extract<'a>(doc: &Document, node: NodeId, properties: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, String> {
  let tag = doc.tag_name(node).unwrap_or_default();
  properties
    .into_iter()
    .filter_map(|property| {
      let value = doc.computed_style(node, property)?;
      is_meaningful(tag, property, value).then(|| (property.to_string(), value.trim().to_string()))
    })
    .collect()
}

/// Short style summary for the detailed export.
pub fn contextual_styles(doc: &Document, node: NodeId) -> BTreeMap<String, String> {
  extract(doc, node, category(doc, node).contextual_properties().iter().copied())
}

/// Full style diff for forensic collection.
pub fn forensic_styles(doc: &Document, node: NodeId) -> BTreeMap<String, String> {
  let extras = category(doc, node).forensic_extras();
  let properties = FORENSIC_COMMON
    .iter()
    .chain(extras.iter().filter(|p| !FORENSIC_COMMON.contains(*p)))
    .copied();
  extract(doc, node, properties)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dom::testing::page;
  use serde_json::json;

  #[test]
  fn forensic_drops_default_display() {
    let doc = page(json!([
      {"tag": "div", "attrs": {"id": "x"}, "style": {"display": "block", "color": "rgb(255, 0, 0)"}}
    ]));
    let node = doc.get_element_by_id("x").unwrap();
    let styles = forensic_styles(&doc, node);
    assert_eq!(styles.len(), 1);
    assert_eq!(styles.get("color").map(String::as_str), Some("rgb(255, 0, 0)"));
  }

  #[test]
  fn non_default_display_is_kept() {
    let doc = page(json!([{"tag": "span", "attrs": {"id": "x"}, "style": {"display": "block"}}]));
    let node = doc.get_element_by_id("x").unwrap();
    assert_eq!(
      forensic_styles(&doc, node).get("display").map(String::as_str),
      Some("block")
    );
  }

  #[test]
  fn meaningless_values_are_dropped() {
    assert!(!is_meaningful("div", "background-color", "rgba(0, 0, 0, 0)"));
    assert!(!is_meaningful("div", "margin", "0px"));
    assert!(!is_meaningful("div", "position", "static"));
    assert!(!is_meaningful("div", "opacity", "1"));
    assert!(is_meaningful("div", "opacity", "0.5"));
    assert!(is_meaningful("div", "padding", "8px 16px"));
  }

  #[test]
  fn categories() {
    let doc = page(json!([
      {"tag": "button", "attrs": {"id": "b"}},
      {"tag": "div", "attrs": {"id": "r", "role": "button"}},
      {"tag": "select", "attrs": {"id": "s"}},
      {"tag": "h2", "attrs": {"id": "h"}},
      {"tag": "video", "attrs": {"id": "v"}},
      {"tag": "section", "attrs": {"id": "c"}}
    ]));
    let cat = |id: &str| category(&doc, doc.get_element_by_id(id).unwrap());
    assert_eq!(cat("b"), ElementCategory::Button);
    assert_eq!(cat("r"), ElementCategory::Button);
    assert_eq!(cat("s"), ElementCategory::Input);
    assert_eq!(cat("h"), ElementCategory::Text);
    assert_eq!(cat("v"), ElementCategory::Media);
    assert_eq!(cat("c"), ElementCategory::Container);
  }

  #[test]
  fn contextual_uses_category_whitelist() {
    let doc = page(json!([
      {"tag": "button", "attrs": {"id": "b"}, "style": {
        "background-color": "rgb(60, 130, 247)", "padding": "8px 16px", "z-index": "10"
      }}
    ]));
    let node = doc.get_element_by_id("b").unwrap();
    let styles = contextual_styles(&doc, node);
    assert!(styles.contains_key("background-color"));
    assert!(styles.contains_key("padding"));
    assert!(!styles.contains_key("z-index"));
    assert!(forensic_styles(&doc, node).contains_key("z-index"));
  }
}
