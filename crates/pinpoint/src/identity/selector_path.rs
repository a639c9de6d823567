/*!
Selector-path synthesis.

[`generate`] builds a short selector that is unique in the document at call
time whenever the element is distinguishable at all; [`generate_full_path`]
records the complete ancestor chain for forensic output.
*/

use std::sync::LazyLock;

use regex::Regex;

use super::{link_target, meaningful_class, LinkTarget};
use crate::dom::{escape_ident, escape_string, Document};
use crate::types::NodeId;

/// Max segments in a generated path, the target included.
const MAX_SEGMENTS: usize = 4;

/// Tags whose class is qualified with the tag and which end the ancestor
/// walk from depth 2 on.
const SEMANTIC_ANCHOR_TAGS: &[&str] = &[
  "header", "footer", "nav", "aside", "article", "section", "form", "table", "ul", "ol", "dialog",
];

/// Tags skipped during the ancestor walk unless they yield a real selector.
const WRAPPER_TAGS: &[&str] = &["div", "span", "body", "html", "main"];

/// Framework-generated ids (React `useId`, headless UI libraries, hashes,
/// long digit runs) that change between renders.
static GENERATED_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"^(?::[rR][0-9a-zA-Z]*:|(?:radix|headlessui|mui|react-aria|downshift|rc-tabs|ember|ext-gen|yui_|gwt-uid).*)$|[0-9a-fA-F]{8,}|\d{4,}",
  )
  .expect("BUG: invalid GENERATED_ID_RE regex literal")
});

fn looks_generated_id(id: &str) -> bool {
  GENERATED_ID_RE.is_match(id) || super::clean_class(id).as_deref() != Some(id)
}

/// One-element selector for `node`, by priority: stable `#id`, meaningful
/// class, `[role]`, `[data-testid]`, `tag[name]`, `tag[type]`, same-origin
/// `a[href]`, bare tag.
pub fn direct_selector(doc: &Document, node: NodeId) -> String {
  let tag = doc.tag_name(node).unwrap_or("*");

  if let Some(id) = doc.id_attr(node).filter(|id| !looks_generated_id(id)) {
    return format!("#{}", escape_ident(id));
  }

  if let Some(class) = meaningful_class(doc.class_list(node)) {
    let class = escape_ident(&class);
    return if matches!(tag, "div" | "span") {
      format!(".{class}")
    } else {
      format!("{tag}.{class}")
    };
  }

  if let Some(role) = doc.attribute(node, "role").map(str::trim).filter(|r| !r.is_empty()) {
    return format!("[role=\"{}\"]", escape_string(role));
  }

  if let Some(test_id) = doc.attribute(node, "data-testid").filter(|t| !t.is_empty()) {
    return format!("[data-testid=\"{}\"]", escape_string(test_id));
  }

  let is_control = matches!(tag, "input" | "select" | "textarea" | "button");
  if let Some(name) = doc.attribute(node, "name").filter(|n| is_control && !n.is_empty()) {
    return format!("{tag}[name=\"{}\"]", escape_string(name));
  }

  if let Some(ty) = doc.attribute(node, "type") {
    let default = match tag {
      "input" => Some("text"),
      "button" => Some("submit"),
      _ => None,
    };
    if default.is_some_and(|d| !ty.eq_ignore_ascii_case(d) && !ty.is_empty()) {
      return format!("{tag}[type=\"{}\"]", escape_string(ty));
    }
  }

  if tag == "a" {
    if let Some(href) = doc.attribute(node, "href") {
      if let Some(LinkTarget::SameOrigin(path)) = link_target(doc.url(), href) {
        if path != "/" {
          return format!("a[href=\"{}\"]", escape_string(href));
        }
      }
    }
  }

  tag.to_string()
}

/// Matches of `selector` if it parses and includes `node`.
fn match_count(doc: &Document, selector: &str, node: NodeId) -> Option<usize> {
  let matches = doc.query_selector_all(selector).ok()?;
  matches.contains(&node).then_some(matches.len())
}

fn is_unique(doc: &Document, selector: &str, node: NodeId) -> bool {
  match_count(doc, selector, node) == Some(1)
}

/// Short selector for `node`, unique when the document allows it.
///
/// Best effort: if no candidate is unique, the most specific one that still
/// matches `node` is returned. Never empty.
pub fn generate(doc: &Document, node: NodeId) -> String {
  let direct = direct_selector(doc, node);
  if direct.starts_with('#') || is_unique(doc, &direct, node) {
    return direct;
  }

  // parts[0] is the target; joins[i] sits between parts[i + 1] and parts[i].
  let mut parts = vec![direct];
  let mut joins: Vec<&str> = Vec::new();
  let mut skipped_wrapper = false;

  for (depth, ancestor) in doc.ancestors(node).enumerate().map(|(i, a)| (i + 1, a)) {
    if parts.len() >= MAX_SEGMENTS {
      break;
    }
    let tag = doc.tag_name(ancestor).unwrap_or_default();
    let selector = direct_selector(doc, ancestor);
    if WRAPPER_TAGS.contains(&tag) && selector == tag {
      skipped_wrapper = true;
      continue;
    }

    // `>` only between direct parent and child; a skipped wrapper in
    // between needs the descendant combinator to keep matching.
    joins.push(if skipped_wrapper { " " } else { " > " });
    skipped_wrapper = false;

    let stop = selector.starts_with('#') || (depth >= 2 && SEMANTIC_ANCHOR_TAGS.contains(&tag));
    parts.push(selector);
    if stop {
      break;
    }
  }

  let mut path = parts.last().cloned().unwrap_or_default();
  for i in (0..parts.len().saturating_sub(1)).rev() {
    path.push_str(joins.get(i).copied().unwrap_or(" "));
    path.push_str(&parts[i]);
  }

  if is_unique(doc, &path, node) {
    return path;
  }

  let nth = format!("{path}:nth-of-type({})", doc.type_position(node));
  match (match_count(doc, &path, node), match_count(doc, &nth, node)) {
    (_, Some(1)) => nth,
    (Some(a), Some(b)) if b < a => nth,
    (None, Some(_)) => nth,
    _ => path,
  }
}

/// Every ancestor up to `html` as `tag#id.c1.c2.c3`, with `:nth-child(n)`
/// whenever the parent has more than one element child.
pub fn generate_full_path(doc: &Document, node: NodeId) -> String {
  let mut segments = Vec::new();

  for current in std::iter::once(node).chain(doc.ancestors(node)) {
    let Some(tag) = doc.tag_name(current) else {
      continue;
    };
    let mut segment = tag.to_string();
    if let Some(id) = doc.id_attr(current) {
      segment.push('#');
      segment.push_str(&escape_ident(id));
    }
    for class in doc.class_list(current).into_iter().take(3) {
      segment.push('.');
      segment.push_str(&escape_ident(class));
    }
    if let Some(parent) = doc.parent(current) {
      if doc.element_children(parent).count() > 1 {
        segment.push_str(&format!(":nth-child({})", doc.element_position(current)));
      }
    }
    segments.push(segment);
  }

  segments.reverse();
  segments.join(" > ")
}
