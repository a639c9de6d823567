/*!
Re-acquiring live elements for persisted annotations.

Two strategies in strict order: the stored selector path, then the stored
id. Both are guarded by a tag-name check. There is no fuzzy matching; callers
retry (with backoff) for content that renders late.
*/

use crate::dom::Document;
use crate::fallible::swallow;
use crate::types::{ElementInfo, NodeId};

/// Find the live element `info` describes, or `None`.
///
/// Malformed selectors from stale or foreign data count as "no match".
pub fn refind(doc: &Document, info: &ElementInfo) -> Option<NodeId> {
  let tag_matches = |node: &NodeId| {
    doc
      .tag_name(*node)
      .is_some_and(|tag| tag.eq_ignore_ascii_case(&info.tag_name))
  };

  let by_selector = swallow(
    "refind",
    doc
      .query_selector(&info.selector_path)
      .map_err(|e| e.for_selector(&info.selector_path)),
  )
  .flatten()
  .filter(tag_matches);
  if by_selector.is_some() {
    return by_selector;
  }

  info
    .id
    .as_deref()
    .and_then(|id| doc.get_element_by_id(id))
    .filter(tag_matches)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dom::testing::page;
  use crate::identity::collect_element_info;
  use serde_json::json;

  fn info_for(doc: &Document, id: &str) -> ElementInfo {
    collect_element_info(doc, doc.get_element_by_id(id).unwrap(), false).unwrap()
  }

  #[test]
  fn finds_by_selector_after_reload() {
    let fixture = json!([{"tag": "nav", "children": [
      {"tag": "a", "attrs": {"href": "/docs"}, "children": ["Docs"]},
      {"tag": "a", "attrs": {"href": "/blog", "id": "blog"}, "children": ["Blog"]}
    ]}]);
    let before = page(fixture.clone());
    let info = info_for(&before, "blog");

    let after = page(fixture);
    let found = refind(&after, &info).unwrap();
    assert_eq!(after.get_element_by_id("blog"), Some(found));
  }

  #[test]
  fn falls_back_to_id() {
    let before = page(json!([{"tag": "section", "attrs": {"class": "promo"}, "children": [
      {"tag": "button", "attrs": {"id": "buy"}, "children": ["Buy"]}
    ]}]));
    let mut info = info_for(&before, "buy");
    info.selector_path = ".promo > button.gone".to_string();

    let after = page(json!([{"tag": "button", "attrs": {"id": "buy"}, "children": ["Buy"]}]));
    assert_eq!(refind(&after, &info), after.get_element_by_id("buy"));
  }

  #[test]
  fn tag_guard_rejects_same_id_different_tag() {
    let before = page(json!([{"tag": "button", "attrs": {"id": "x"}}]));
    let info = info_for(&before, "x");

    let after = page(json!([{"tag": "div", "attrs": {"id": "x"}}]));
    assert_eq!(refind(&after, &info), None);
  }

  #[test]
  fn malformed_selector_is_no_match() {
    let doc = page(json!([{"tag": "button", "attrs": {"id": "x"}}]));
    let mut info = info_for(&doc, "x");
    info.selector_path = "button:has(> span)".to_string();
    info.id = None;
    assert_eq!(refind(&doc, &info), None);

    info.selector_path = "[[[".to_string();
    assert_eq!(refind(&doc, &info), None);
  }
}
