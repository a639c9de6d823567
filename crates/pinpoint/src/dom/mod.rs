/*!
Document model the engine runs against.

A [`Document`] is an arena of nodes keyed by [`NodeId`] plus a [`NodeTree`]
for parent/child links. It is usually built from a [`DomSnapshot`] captured
in the browser, and can be mutated afterwards to model DOM churn (SPA
navigation, re-renders, removal).

## Coordinates

`rect()` is viewport-relative (`getBoundingClientRect`). Internally rects of
regular elements are stored document-absolute so that `set_scroll` moves
them; elements inside a `position: fixed|sticky` subtree are stored as-is.

## Module Structure

- `mod.rs` - `Document`, node storage, queries
- `snapshot.rs` - serde snapshot format and builder
- `selector.rs` - CSS selector parser and matcher
- `text.rs` - visible text extraction
- `tree.rs` - `NodeTree` for parent/child relationships
*/

mod selector;
mod snapshot;
mod text;
mod tree;

#[cfg(test)]
pub(crate) mod testing;

pub use selector::{escape_ident, escape_string, Selector, SelectorError};
pub use snapshot::{DomSnapshot, ElementSnapshot, NodeSnapshot};
pub use text::{
  collapse_whitespace, inner_text, label_text, truncate, visible_text, visible_text_excluding,
  INNER_TEXT_MAX, LABEL_TEXT_MAX,
};

use std::collections::{BTreeMap, HashMap};

use crate::types::{Bounds, NodeId, PinpointError, PinpointResult, Point};
use serde::{Deserialize, Serialize};
use tree::NodeTree;
use ts_rs::TS;

/// Viewport size and scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Viewport {
  /// Viewport width in CSS pixels.
  pub width: f64,
  /// Viewport height in CSS pixels.
  pub height: f64,
  /// Horizontal scroll offset.
  #[serde(default)]
  pub scroll_x: f64,
  /// Vertical scroll offset.
  #[serde(default)]
  pub scroll_y: f64,
}

impl Default for Viewport {
  fn default() -> Self {
    Self {
      width: 1280.0,
      height: 800.0,
      scroll_x: 0.0,
      scroll_y: 0.0,
    }
  }
}

/// Framework component that rendered an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComponentRef {
  /// Component display name.
  pub name: String,
  /// Framework that owns the component, e.g. `react`.
  pub framework: String,
}

#[derive(Debug, Clone, Default)]
struct ElementData {
  /// Lowercase.
  tag: String,
  /// Insertion order, names lowercase.
  attrs: Vec<(String, String)>,
  /// Document-absolute unless the element is fixed-positioned.
  rect: Bounds,
  style: BTreeMap<String, String>,
  value: Option<String>,
  media_paused: Option<bool>,
  component: Option<ComponentRef>,
}

#[derive(Debug, Clone)]
enum Node {
  Element(ElementData),
  Text(String),
}

/// A page document.
#[derive(Debug, Clone)]
pub struct Document {
  url: String,
  viewport: Viewport,
  nodes: HashMap<NodeId, Node>,
  tree: NodeTree,
  root: NodeId,
}

/// User-agent default `display` for a tag.
pub fn default_display(tag: &str) -> &'static str {
  match tag {
    "html" | "body" | "div" | "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "header"
    | "footer" | "nav" | "main" | "aside" | "article" | "section" | "form" | "figure"
    | "figcaption" | "ul" | "ol" | "dl" | "dd" | "dt" | "blockquote" | "pre" | "hr"
    | "address" | "fieldset" | "details" | "dialog" | "legend" => "block",
    "li" => "list-item",
    "table" => "table",
    "tr" => "table-row",
    "td" | "th" => "table-cell",
    "thead" => "table-header-group",
    "tbody" => "table-row-group",
    "tfoot" => "table-footer-group",
    "caption" => "table-caption",
    "button" | "input" | "select" | "textarea" | "img" | "video" | "canvas" | "iframe"
    | "audio" | "meter" | "progress" => "inline-block",
    "script" | "style" | "head" | "title" | "meta" | "link" | "template" => "none",
    _ => "inline",
  }
}

impl Document {
  /// Empty `<html><body></body></html>` document.
  pub fn new(url: impl Into<String>, viewport: Viewport) -> Self {
    let mut doc = Self::with_root(url.into(), viewport, "html");
    let body = doc.create_element("body");
    doc.tree.append(doc.root, body);
    doc
  }

  fn with_root(url: String, viewport: Viewport, root_tag: &str) -> Self {
    let root = NodeId::new();
    let mut nodes = HashMap::new();
    nodes.insert(
      root,
      Node::Element(ElementData {
        tag: root_tag.to_ascii_lowercase(),
        ..ElementData::default()
      }),
    );
    Self {
      url,
      viewport,
      nodes,
      tree: NodeTree::new(),
      root,
    }
  }

  /// Parse a JSON-encoded [`DomSnapshot`].
  pub fn from_json(json: &str) -> PinpointResult<Self> {
    let snapshot: DomSnapshot =
      serde_json::from_str(json).map_err(|e| PinpointError::InvalidSnapshot(e.to_string()))?;
    Self::from_snapshot(&snapshot)
  }

  // === Page state ===

  /// Page URL as captured.
  pub fn url(&self) -> &str {
    &self.url
  }

  /// `scheme://host[:port]` of the page URL. `None` for opaque origins.
  pub fn origin(&self) -> Option<String> {
    let origin = url::Url::parse(&self.url).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
  }

  /// Current viewport, including scroll.
  pub fn viewport(&self) -> Viewport {
    self.viewport
  }

  /// Scroll the page. Fixed-position rects keep their viewport position.
  pub fn set_scroll(&mut self, x: f64, y: f64) {
    self.viewport.scroll_x = x;
    self.viewport.scroll_y = y;
  }

  /// The document element (`<html>`).
  pub fn root(&self) -> NodeId {
    self.root
  }

  /// `<body>`, or the root if the document has none.
  pub fn body(&self) -> NodeId {
    self
      .element_children(self.root)
      .find(|&n| self.tag_name(n) == Some("body"))
      .unwrap_or(self.root)
  }

  // === Mutation ===

  /// Create a detached element.
  pub fn create_element(&mut self, tag: &str) -> NodeId {
    let id = NodeId::new();
    self.nodes.insert(
      id,
      Node::Element(ElementData {
        tag: tag.to_ascii_lowercase(),
        ..ElementData::default()
      }),
    );
    id
  }

  /// Create a detached text node.
  pub fn create_text(&mut self, text: &str) -> NodeId {
    let id = NodeId::new();
    self.nodes.insert(id, Node::Text(text.to_string()));
    id
  }

  /// Append `child` as the last child of `parent`.
  ///
  /// Nodes cannot be moved once attached.
  pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> PinpointResult<()> {
    match self.nodes.get(&parent) {
      None => return Err(PinpointError::NodeNotFound(parent)),
      Some(Node::Text(_)) => {
        return Err(PinpointError::InvalidSnapshot(format!(
          "text node {parent} cannot have children"
        )))
      }
      Some(Node::Element(_)) => {}
    }
    if !self.nodes.contains_key(&child) {
      return Err(PinpointError::NodeNotFound(child));
    }
    if child == self.root || self.contains(child, parent) {
      return Err(PinpointError::InvalidSnapshot(format!(
        "appending {child} under {parent} would create a cycle"
      )));
    }
    if self.tree.append(parent, child) {
      Ok(())
    } else {
      Err(PinpointError::InvalidSnapshot(format!(
        "node {child} already has a parent"
      )))
    }
  }

  /// Remove a node and its subtree. Handles to removed nodes stop resolving.
  pub fn remove(&mut self, node: NodeId) {
    if node == self.root {
      log::warn!("remove: refusing to remove the document element");
      return;
    }
    for id in self.tree.detach(node) {
      self.nodes.remove(&id);
    }
  }

  /// Set or replace an attribute. No-op for text nodes.
  pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
    let name = name.to_ascii_lowercase();
    if let Some(data) = self.element_mut(node) {
      match data.attrs.iter_mut().find(|(k, _)| *k == name) {
        Some(slot) => slot.1 = value.to_string(),
        None => data.attrs.push((name, value.to_string())),
      }
    }
  }

  /// Remove an attribute if present.
  pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
    let name = name.to_ascii_lowercase();
    if let Some(data) = self.element_mut(node) {
      data.attrs.retain(|(k, _)| *k != name);
    }
  }

  /// Set the viewport-relative bounding rect.
  pub fn set_rect(&mut self, node: NodeId, rect: Bounds) {
    let stored = self.to_stored_rect(node, rect);
    if let Some(data) = self.element_mut(node) {
      data.rect = stored;
    }
  }

  /// Set one computed style property.
  pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
    if let Some(data) = self.element_mut(node) {
      data
        .style
        .insert(property.to_ascii_lowercase(), value.to_string());
    }
  }

  /// Set the live `.value` of a form control.
  pub fn set_value(&mut self, node: NodeId, value: &str) {
    if let Some(data) = self.element_mut(node) {
      data.value = Some(value.to_string());
    }
  }

  /// Record the paused state of an `<audio>`/`<video>` element.
  pub fn set_media_paused(&mut self, node: NodeId, paused: bool) {
    if let Some(data) = self.element_mut(node) {
      data.media_paused = Some(paused);
    }
  }

  /// Attach (or clear) the framework component that rendered `node`.
  pub fn set_component(&mut self, node: NodeId, component: Option<ComponentRef>) {
    if let Some(data) = self.element_mut(node) {
      data.component = component;
    }
  }

  // === Element data ===

  fn element(&self, node: NodeId) -> Option<&ElementData> {
    match self.nodes.get(&node) {
      Some(Node::Element(data)) => Some(data),
      _ => None,
    }
  }

  fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
    match self.nodes.get_mut(&node) {
      Some(Node::Element(data)) => Some(data),
      _ => None,
    }
  }

  /// True for live element nodes.
  pub fn is_element(&self, node: NodeId) -> bool {
    self.element(node).is_some()
  }

  /// Lowercase tag name, `None` for text or unknown nodes.
  pub fn tag_name(&self, node: NodeId) -> Option<&str> {
    self.element(node).map(|d| d.tag.as_str())
  }

  /// Attribute value, names matched case-insensitively.
  pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
    self.element(node).and_then(|d| {
      d.attrs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
    })
  }

  /// True if the attribute is present, even when empty.
  pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
    self.attribute(node, name).is_some()
  }

  /// All attributes in insertion order.
  pub fn attributes(&self, node: NodeId) -> impl Iterator<Item = (&str, &str)> + '_ {
    self
      .element(node)
      .into_iter()
      .flat_map(|d| d.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
  }

  /// Non-empty `id` attribute.
  pub fn id_attr(&self, node: NodeId) -> Option<&str> {
    self.attribute(node, "id").filter(|id| !id.is_empty())
  }

  /// Class tokens, deduplicated, in order.
  pub fn class_list(&self, node: NodeId) -> Vec<&str> {
    let mut classes: Vec<&str> = Vec::new();
    for class in self.attribute(node, "class").unwrap_or("").split_whitespace() {
      if !classes.contains(&class) {
        classes.push(class);
      }
    }
    classes
  }

  /// Concatenated text of every descendant text node.
  pub fn text_content(&self, node: NodeId) -> String {
    let mut out = String::new();
    if let Some(Node::Text(t)) = self.nodes.get(&node) {
      out.push_str(t);
    }
    for id in self.descendants(node) {
      if let Some(Node::Text(t)) = self.nodes.get(&id) {
        out.push_str(t);
      }
    }
    out
  }

  /// Raw text of a text node.
  pub fn text(&self, node: NodeId) -> Option<&str> {
    match self.nodes.get(&node) {
      Some(Node::Text(t)) => Some(t),
      _ => None,
    }
  }

  /// Viewport-relative bounding rect (zero for text and unknown nodes).
  pub fn rect(&self, node: NodeId) -> Bounds {
    let Some(data) = self.element(node) else {
      return Bounds::default();
    };
    if self.is_fixed_position(node) {
      data.rect
    } else {
      Bounds::new(
        data.rect.x - self.viewport.scroll_x,
        data.rect.y - self.viewport.scroll_y,
        data.rect.w,
        data.rect.h,
      )
    }
  }

  fn to_stored_rect(&self, node: NodeId, rect: Bounds) -> Bounds {
    if self.is_fixed_position(node) {
      rect
    } else {
      Bounds::new(
        rect.x + self.viewport.scroll_x,
        rect.y + self.viewport.scroll_y,
        rect.w,
        rect.h,
      )
    }
  }

  /// Computed value of `property`, falling back to the user-agent default
  /// for `display`.
  pub fn computed_style(&self, node: NodeId, property: &str) -> Option<&str> {
    let data = self.element(node)?;
    match data.style.get(property) {
      Some(v) => Some(v.as_str()),
      None if property == "display" => Some(default_display(&data.tag)),
      None => None,
    }
  }

  /// Every explicitly captured computed style.
  pub fn computed_styles(&self, node: NodeId) -> Option<&BTreeMap<String, String>> {
    self.element(node).map(|d| &d.style)
  }

  /// True if the element or an ancestor is `position: fixed` or `sticky`.
  pub fn is_fixed_position(&self, node: NodeId) -> bool {
    std::iter::once(node)
      .chain(self.ancestors(node))
      .any(|n| matches!(self.computed_style(n, "position"), Some("fixed" | "sticky")))
  }

  /// Live `.value`: the captured value, else the `value` attribute.
  pub fn value(&self, node: NodeId) -> Option<&str> {
    self
      .element(node)
      .and_then(|d| d.value.as_deref())
      .or_else(|| self.attribute(node, "value"))
  }

  /// Media paused state, `None` for non-media elements.
  pub fn media_paused(&self, node: NodeId) -> Option<bool> {
    self.element(node).and_then(|d| d.media_paused)
  }

  /// Framework component recorded for the element.
  pub fn component(&self, node: NodeId) -> Option<&ComponentRef> {
    self.element(node).and_then(|d| d.component.as_ref())
  }

  // === Navigation ===

  /// Parent node, `None` for the root and detached nodes.
  pub fn parent(&self, node: NodeId) -> Option<NodeId> {
    self.tree.parent(node)
  }

  /// Child nodes (elements and text) in order.
  pub fn children(&self, node: NodeId) -> &[NodeId] {
    self.tree.children(node)
  }

  /// Element children only, in order.
  pub fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    self
      .children(node)
      .iter()
      .copied()
      .filter(|&c| self.is_element(c))
  }

  /// Closest preceding element sibling.
  pub fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
    let parent = self.parent(node)?;
    self
      .element_children(parent)
      .take_while(|&c| c != node)
      .last()
  }

  /// Closest following element sibling.
  pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
    let parent = self.parent(node)?;
    self.element_children(parent).skip_while(|&c| c != node).nth(1)
  }

  /// 1-based position among the parent's element children.
  pub fn element_position(&self, node: NodeId) -> usize {
    self.parent(node).map_or(1, |parent| {
      self
        .element_children(parent)
        .position(|c| c == node)
        .map_or(1, |i| i + 1)
    })
  }

  /// 1-based position among same-tag siblings.
  pub fn type_position(&self, node: NodeId) -> usize {
    let tag = self.tag_name(node);
    self.parent(node).map_or(1, |parent| {
      self
        .element_children(parent)
        .filter(|&c| self.tag_name(c) == tag)
        .position(|c| c == node)
        .map_or(1, |i| i + 1)
    })
  }

  /// Ancestors from the parent up to the root.
  pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(self.parent(node), move |&n| self.parent(n))
  }

  /// Inclusive: a node contains itself.
  pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
    ancestor == node || self.ancestors(node).any(|a| a == ancestor)
  }

  /// True if the node still exists and is attached under the root.
  pub fn is_connected(&self, node: NodeId) -> bool {
    self.nodes.contains_key(&node) && (node == self.root || self.ancestors(node).any(|a| a == self.root))
  }

  /// Descendants of `node` in document order (excluding `node`).
  pub fn descendants(&self, node: NodeId) -> Descendants<'_> {
    let mut stack: Vec<NodeId> = self.children(node).to_vec();
    stack.reverse();
    Descendants { doc: self, stack }
  }

  /// Every connected element in document order, root first.
  pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::once(self.root)
      .chain(self.descendants(self.root))
      .filter(|&n| self.is_element(n))
  }

  // === Queries ===

  /// First connected element with the given id.
  pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
    if id.is_empty() {
      return None;
    }
    self.elements().find(|&n| self.attribute(n, "id") == Some(id))
  }

  /// Every element matching `selector`, in document order.
  pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
    let selector = Selector::parse(selector)?;
    Ok(self.select_all(&selector))
  }

  /// First element matching `selector`.
  pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
    let selector = Selector::parse(selector)?;
    Ok(self.elements().find(|&n| selector.matches(self, n)))
  }

  /// Matches of a pre-parsed selector, in document order.
  pub fn select_all(&self, selector: &Selector) -> Vec<NodeId> {
    self
      .elements()
      .filter(|&n| selector.matches(self, n))
      .collect()
  }

  /// True if `node` matches `selector`.
  pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, SelectorError> {
    Ok(Selector::parse(selector)?.matches(self, node))
  }

  /// Topmost element under a viewport point: the last element in document
  /// order whose non-empty rect contains it.
  pub fn element_at(&self, point: Point) -> Option<NodeId> {
    self
      .elements()
      .filter(|&n| {
        let r = self.rect(n);
        r.w > 0.0 && r.h > 0.0 && r.contains(point)
      })
      .last()
  }
}

/// Preorder iterator returned by [`Document::descendants`].
pub struct Descendants<'a> {
  doc: &'a Document,
  stack: Vec<NodeId>,
}

impl std::fmt::Debug for Descendants<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Descendants")
      .field("pending", &self.stack)
      .finish_non_exhaustive()
  }
}

impl Iterator for Descendants<'_> {
  type Item = NodeId;

  fn next(&mut self) -> Option<NodeId> {
    let node = self.stack.pop()?;
    self
      .stack
      .extend(self.doc.children(node).iter().rev().copied());
    Some(node)
  }
}
