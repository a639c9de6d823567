/*!
Visible text extraction.

Labels must not leak invisible content, so `script`, `style` and
`aria-hidden="true"` subtrees are skipped before reading text.
*/

use super::Document;
use crate::types::NodeId;

/// Max characters of text used inside a human-readable label.
pub const LABEL_TEXT_MAX: usize = 40;

/// Max characters of `ElementInfo::inner_text`.
pub const INNER_TEXT_MAX: usize = 200;

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
  s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to `max` characters, appending `...` when shortened.
pub fn truncate(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    return s.to_string();
  }
  let head: String = s.chars().take(max).collect();
  format!("{}...", head.trim_end())
}

fn is_hidden_subtree(doc: &Document, node: NodeId) -> bool {
  matches!(doc.tag_name(node), Some("script" | "style" | "noscript" | "template"))
    || doc.attribute(node, "aria-hidden") == Some("true")
}

/// Whitespace-collapsed text of `node`, skipping hidden descendants.
pub fn visible_text(doc: &Document, node: NodeId) -> String {
  visible_text_excluding(doc, node, |_| false)
}

/// [`visible_text`], additionally skipping subtrees rooted at nodes for
/// which `skip` returns true.
pub fn visible_text_excluding(doc: &Document, node: NodeId, skip: impl Fn(NodeId) -> bool) -> String {
  let mut raw = String::new();
  if let Some(t) = doc.text(node) {
    raw.push_str(t);
  }

  let mut stack: Vec<NodeId> = doc.children(node).iter().rev().copied().collect();
  while let Some(id) = stack.pop() {
    if let Some(t) = doc.text(id) {
      raw.push_str(t);
      continue;
    }
    if is_hidden_subtree(doc, id) || skip(id) {
      continue;
    }
    stack.extend(doc.children(id).iter().rev().copied());
  }

  collapse_whitespace(&raw)
}

/// Text shown by a form control or element, for labels.
///
/// Inputs and textareas use their value, then their placeholder. Selects use
/// the selected option. Truncated to [`LABEL_TEXT_MAX`].
pub fn label_text(doc: &Document, node: NodeId) -> String {
  let text = match doc.tag_name(node) {
    Some("input" | "textarea") => doc
      .value(node)
      .filter(|v| !v.trim().is_empty())
      .or_else(|| doc.attribute(node, "placeholder"))
      .map(collapse_whitespace)
      .unwrap_or_default(),
    Some("select") => selected_option(doc, node)
      .map(|opt| visible_text(doc, opt))
      .unwrap_or_default(),
    _ => visible_text(doc, node),
  };
  truncate(&text, LABEL_TEXT_MAX)
}

/// `innerText` approximation, truncated to [`INNER_TEXT_MAX`].
pub fn inner_text(doc: &Document, node: NodeId) -> String {
  truncate(&visible_text(doc, node), INNER_TEXT_MAX)
}

/// The option a `<select>` shows: captured value, then `selected`, then first.
fn selected_option(doc: &Document, select: NodeId) -> Option<NodeId> {
  let options: Vec<NodeId> = doc
    .descendants(select)
    .filter(|&n| doc.tag_name(n) == Some("option"))
    .collect();

  let option_value = |opt: NodeId| {
    doc
      .attribute(opt, "value")
      .map_or_else(|| visible_text(doc, opt), str::to_string)
  };

  if let Some(value) = doc.element_value_only(select) {
    if let Some(&opt) = options.iter().find(|&&o| option_value(o) == value) {
      return Some(opt);
    }
  }
  options
    .iter()
    .copied()
    .find(|&o| doc.has_attribute(o, "selected"))
    .or_else(|| options.first().copied())
}

impl Document {
  /// Captured live value without the attribute fallback.
  fn element_value_only(&self, node: NodeId) -> Option<&str> {
    match self.nodes.get(&node) {
      Some(super::Node::Element(data)) => data.value.as_deref(),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dom::testing::page;
  use serde_json::json;

  #[test]
  fn truncates_with_ellipsis() {
    assert_eq!(truncate("short", 40), "short");
    let long = "a".repeat(50);
    let t = truncate(&long, 40);
    assert_eq!(t, format!("{}...", "a".repeat(40)));
  }

  #[test]
  fn truncate_counts_chars_not_bytes() {
    assert_eq!(truncate("héllo wörld", 5), "héllo...");
  }

  #[test]
  fn collapses_whitespace() {
    assert_eq!(collapse_whitespace("  Save \n\t changes  "), "Save changes");
  }

  #[test]
  fn skips_hidden_content() {
    let doc = page(json!([{"tag": "button", "attrs": {"id": "b"}, "children": [
      {"tag": "span", "attrs": {"aria-hidden": "true"}, "children": ["★"]},
      "  Save  ",
      {"tag": "script", "children": ["track()"]},
      {"tag": "style", "children": [".x{}"]}
    ]}]));
    let b = doc.get_element_by_id("b").unwrap();
    assert_eq!(visible_text(&doc, b), "Save");
  }

  #[test]
  fn nested_text_reads_in_document_order() {
    let doc = page(json!([{"tag": "div", "attrs": {"id": "d"}, "children": [
      {"tag": "p", "children": ["Hello"]},
      "\n  ",
      {"tag": "p", "children": ["wor", {"tag": "b", "children": ["ld"]}]}
    ]}]));
    let d = doc.get_element_by_id("d").unwrap();
    assert_eq!(visible_text(&doc, d), "Hello world");
  }

  mod form_controls {
    use super::*;

    #[test]
    fn input_value_then_placeholder() {
      let doc = page(json!([
        {"tag": "input", "attrs": {"id": "a", "placeholder": "Search"}, "value": "shoes"},
        {"tag": "input", "attrs": {"id": "b", "placeholder": "Search"}},
        {"tag": "textarea", "attrs": {"id": "c"}}
      ]));
      let a = doc.get_element_by_id("a").unwrap();
      let b = doc.get_element_by_id("b").unwrap();
      let c = doc.get_element_by_id("c").unwrap();
      assert_eq!(label_text(&doc, a), "shoes");
      assert_eq!(label_text(&doc, b), "Search");
      assert_eq!(label_text(&doc, c), "");
    }

    #[test]
    fn select_uses_selected_option() {
      let doc = page(json!([
        {"tag": "select", "attrs": {"id": "s"}, "children": [
          {"tag": "option", "attrs": {"value": "us"}, "children": ["United States"]},
          {"tag": "option", "attrs": {"value": "fr", "selected": ""}, "children": ["France"]}
        ]},
        {"tag": "select", "attrs": {"id": "live"}, "value": "us", "children": [
          {"tag": "option", "attrs": {"value": "us"}, "children": ["United States"]},
          {"tag": "option", "attrs": {"value": "fr", "selected": ""}, "children": ["France"]}
        ]}
      ]));
      let s = doc.get_element_by_id("s").unwrap();
      let live = doc.get_element_by_id("live").unwrap();
      assert_eq!(label_text(&doc, s), "France");
      assert_eq!(label_text(&doc, live), "United States");
    }
  }
}
