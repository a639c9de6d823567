/*!
Serialized page snapshot.

Captured in the browser by walking the live DOM and recording, per element,
what the engine needs: attributes, the bounding client rect, the computed
styles that differ from defaults, live form values and media state.

```json
{
  "url": "https://shop.example.com/cart",
  "viewport": { "width": 1280, "height": 800, "scrollX": 0, "scrollY": 120 },
  "root": { "tag": "html", "children": [
    { "tag": "body", "children": [
      { "tag": "button", "attrs": { "type": "submit" },
        "rect": { "x": 40, "y": 300, "w": 120, "h": 32 },
        "children": ["Checkout"] }
    ]}
  ]}
}
```
*/

use std::collections::BTreeMap;

use super::{ComponentRef, Document, Viewport};
use crate::types::{Bounds, NodeId, PinpointResult};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A page captured in the browser: URL, viewport and the element tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DomSnapshot {
  /// Page URL.
  #[serde(default)]
  pub url: String,
  /// Viewport at capture time.
  #[serde(default)]
  pub viewport: Viewport,
  /// The document element.
  pub root: ElementSnapshot,
}

/// Bare strings are text nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum NodeSnapshot {
  /// A text node.
  Text(String),
  /// An element with its subtree.
  Element(ElementSnapshot),
}

/// One captured element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ElementSnapshot {
  /// Tag name, any case.
  pub tag: String,
  /// Attributes by name.
  #[serde(default)]
  pub attrs: BTreeMap<String, String>,
  /// Viewport-relative at capture time.
  #[serde(default)]
  pub rect: Option<Bounds>,
  /// Computed styles worth keeping (display, position, visibility...).
  #[serde(default)]
  pub style: BTreeMap<String, String>,
  /// Live `.value` of form controls.
  #[serde(default)]
  pub value: Option<String>,
  /// Paused state of media elements.
  #[serde(default)]
  pub media_paused: Option<bool>,
  /// Framework component that rendered the element.
  #[serde(default)]
  pub component: Option<ComponentRef>,
  /// Child nodes in order.
  #[serde(default)]
  pub children: Vec<NodeSnapshot>,
}

impl Document {
  /// Build a document from a snapshot. Iterative, so deep pages are fine.
  pub fn from_snapshot(snapshot: &DomSnapshot) -> PinpointResult<Self> {
    let mut doc = Self::with_root(snapshot.url.clone(), snapshot.viewport, &snapshot.root.tag);
    let root = doc.root();
    doc.fill_element(root, &snapshot.root);

    let mut stack: Vec<(NodeId, &ElementSnapshot)> = vec![(root, &snapshot.root)];
    while let Some((parent, element)) = stack.pop() {
      for child in &element.children {
        match child {
          NodeSnapshot::Text(text) => {
            let id = doc.create_text(text);
            doc.append_child(parent, id)?;
          }
          NodeSnapshot::Element(child_element) => {
            let id = doc.create_element(&child_element.tag);
            doc.append_child(parent, id)?;
            doc.fill_element(id, child_element);
            stack.push((id, child_element));
          }
        }
      }
    }

    log::debug!(
      "Loaded snapshot of {} ({} nodes)",
      doc.url(),
      doc.descendants(root).count() + 1
    );
    Ok(doc)
  }

  /// Copy element state. The node must already be attached so fixed
  /// positioning inherited from ancestors is seen when storing the rect.
  fn fill_element(&mut self, id: NodeId, snapshot: &ElementSnapshot) {
    for (name, value) in &snapshot.attrs {
      self.set_attribute(id, name, value);
    }
    for (property, value) in &snapshot.style {
      self.set_style(id, property, value);
    }
    if let Some(ref value) = snapshot.value {
      self.set_value(id, value);
    }
    if let Some(paused) = snapshot.media_paused {
      self.set_media_paused(id, paused);
    }
    if snapshot.component.is_some() {
      self.set_component(id, snapshot.component.clone());
    }
    if let Some(rect) = snapshot.rect {
      self.set_rect(id, rect);
    }
  }
}
