/*! Assembles [`ElementInfo`] snapshots. */

use std::collections::BTreeMap;

use super::{clean_classes, generate, generate_full_path, identify};
use crate::a11y::{accessibility_info, implicit_role, is_landmark_role};
use crate::dom::{inner_text, Document};
use crate::style::forensic_styles;
use crate::types::{ElementInfo, NearbyContext, NodeId, PinpointError, PinpointResult};

/// Attributes already represented elsewhere in `ElementInfo`.
const EXCLUDED_ATTRIBUTES: &[&str] = &["class", "style", "id"];

/// Snapshot everything known about `node` right now.
///
/// Computed styles are only gathered when `forensic` is set.
pub fn collect_element_info(doc: &Document, node: NodeId, forensic: bool) -> PinpointResult<ElementInfo> {
  let tag = doc
    .tag_name(node)
    .filter(|_| doc.is_connected(node))
    .ok_or(PinpointError::NodeNotFound(node))?;

  let (component_path, component_framework) = components(doc, node);

  let info = ElementInfo {
    human_readable: identify(doc, node),
    selector_path: generate(doc, node),
    full_dom_path: generate_full_path(doc, node),
    component_path,
    component_framework,
    tag_name: tag.to_string(),
    id: doc.id_attr(node).map(str::to_string),
    classes: clean_classes(doc.class_list(node)),
    rect: doc.rect(node).into(),
    accessibility: accessibility_info(doc, node),
    computed_styles: forensic.then(|| forensic_styles(doc, node)),
    nearby_context: nearby_context(doc, node),
    inner_text: inner_text(doc, node),
    attributes: attributes(doc, node),
    is_fixed: doc.is_fixed_position(node),
  };

  log::debug!("Collected {} -> {}", info.human_readable, info.selector_path);
  Ok(info)
}

fn attributes(doc: &Document, node: NodeId) -> BTreeMap<String, String> {
  doc
    .attributes(node)
    .filter(|(name, _)| !EXCLUDED_ATTRIBUTES.contains(name))
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

/// Component chain, outermost first (`App > Checkout > PayButton`), and the
/// framework of the innermost component.
fn components(doc: &Document, node: NodeId) -> (Option<String>, Option<String>) {
  let mut chain: Vec<&str> = Vec::new();
  let mut framework = None;

  for current in std::iter::once(node).chain(doc.ancestors(node)) {
    if let Some(component) = doc.component(current) {
      if framework.is_none() {
        framework = Some(component.framework.clone());
      }
      if chain.last() != Some(&component.name.as_str()) {
        chain.push(&component.name);
      }
    }
  }

  if chain.is_empty() {
    return (None, None);
  }
  chain.reverse();
  (Some(chain.join(" > ")), framework)
}

fn nearby_context(doc: &Document, node: NodeId) -> NearbyContext {
  let parent = doc
    .parent(node)
    .filter(|&p| p != doc.root() && p != doc.body());

  let containing_landmark = doc
    .ancestors(node)
    .find(|&a| {
      let explicit = doc.attribute(a, "role").map(str::trim);
      let role = explicit.or_else(|| implicit_role(doc.tag_name(a).unwrap_or_default(), None, false));
      role.is_some_and(is_landmark_role)
    })
    .map(|landmark| identify(doc, landmark));

  NearbyContext {
    parent: parent.map(|p| identify(doc, p)),
    previous_sibling: doc.previous_element_sibling(node).map(|s| identify(doc, s)),
    next_sibling: doc.next_element_sibling(node).map(|s| identify(doc, s)),
    containing_landmark,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dom::testing::page;
  use serde_json::json;

  fn checkout() -> Document {
    page(json!([
      {"tag": "main", "component": {"name": "App", "framework": "react"}, "children": [
        {"tag": "form", "attrs": {"aria-label": "Payment"}, "component": {"name": "Checkout", "framework": "react"}, "children": [
          {"tag": "label", "attrs": {"for": "card"}, "children": ["Card number"]},
          {"tag": "input", "attrs": {"id": "card", "name": "card", "class": "Input_field__x9y8z field", "style": "width: 10px", "autocomplete": "cc-number"},
           "rect": {"x": 20.0, "y": 100.0, "w": 300.0, "h": 40.0},
           "style": {"border": "1px solid rgb(200, 200, 200)"}},
          {"tag": "button", "attrs": {"type": "submit"}, "children": ["Pay"]}
        ]}
      ]}
    ]))
  }

  #[test]
  fn collects_identity_and_context() {
    let doc = checkout();
    let input = doc.get_element_by_id("card").unwrap();
    let info = collect_element_info(&doc, input, false).unwrap();

    assert_eq!(info.human_readable, "text input \"Card number\"");
    assert_eq!(info.selector_path, "#card");
    assert_eq!(info.tag_name, "input");
    assert_eq!(info.id.as_deref(), Some("card"));
    assert_eq!(info.classes, vec!["Input_field", "field"]);
    assert_eq!(info.rect.width, 300.0);
    assert_eq!(info.rect.bottom, 140.0);
    assert_eq!(info.component_path.as_deref(), Some("App > Checkout"));
    assert_eq!(info.component_framework.as_deref(), Some("react"));
    assert_eq!(info.computed_styles, None);
    assert!(info.accessibility.is_interactive);

    assert_eq!(info.nearby_context.parent.as_deref(), Some("form [Payment]"));
    assert_eq!(info.nearby_context.previous_sibling.as_deref(), Some("label \"Card number\""));
    assert_eq!(info.nearby_context.next_sibling.as_deref(), Some("button \"Pay\""));
    assert_eq!(info.nearby_context.containing_landmark.as_deref(), Some("form [Payment]"));
  }

  #[test]
  fn attributes_exclude_class_style_id() {
    let doc = checkout();
    let input = doc.get_element_by_id("card").unwrap();
    let info = collect_element_info(&doc, input, false).unwrap();
    assert_eq!(
      info.attributes.keys().map(String::as_str).collect::<Vec<_>>(),
      vec!["autocomplete", "name"]
    );
  }

  #[test]
  fn forensic_adds_styles() {
    let doc = checkout();
    let input = doc.get_element_by_id("card").unwrap();
    let info = collect_element_info(&doc, input, true).unwrap();
    let styles = info.computed_styles.unwrap();
    assert_eq!(styles.get("border").map(String::as_str), Some("1px solid rgb(200, 200, 200)"));
    assert!(info.full_dom_path.ends_with("input#card.Input_field__x9y8z.field:nth-child(2)"));
  }

  #[test]
  fn selector_path_is_never_empty() {
    let doc = page(json!([{"tag": "div"}, {"tag": "div"}, {"tag": "div", "children": [{"tag": "span"}]}]));
    for node in doc.elements() {
      let info = collect_element_info(&doc, node, false).unwrap();
      assert!(!info.selector_path.is_empty());
    }
  }

  #[test]
  fn inner_text_is_capped() {
    let long = "word ".repeat(100);
    let doc = page(json!([{"tag": "p", "attrs": {"id": "p"}, "children": [long]}]));
    let p = doc.get_element_by_id("p").unwrap();
    let info = collect_element_info(&doc, p, false).unwrap();
    assert!(info.inner_text.ends_with("word..."));
    assert!(info.inner_text.chars().count() <= 203);
  }

  #[test]
  fn detached_nodes_are_not_found() {
    let mut doc = checkout();
    let input = doc.get_element_by_id("card").unwrap();
    doc.remove(input);
    assert!(matches!(
      collect_element_info(&doc, input, false),
      Err(PinpointError::NodeNotFound(_))
    ));
  }
}
