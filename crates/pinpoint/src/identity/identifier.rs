/*!
Human-readable element labels.

`identify` is a pure function of the element's current state. Dispatch runs
top to bottom: interactive roles, headings, text containers, media, tables,
lists, labels, landmarks, then a generic fallback. Within each category the
information sources are tried in a fixed order (visible text, aria-label,
title, placeholder, name, icon-only detection) and every chain ends at a
bare noun, so labeling never fails.

Quoted text (`button "Save"`) is what the user sees; bracketed text
(`button [Close]`) comes from attributes.
*/

use super::{link_target, LinkTarget};
use crate::a11y::resolve_idrefs;
use crate::dom::{
  collapse_whitespace, label_text, truncate, visible_text, visible_text_excluding, Document, LABEL_TEXT_MAX,
};
use crate::types::NodeId;

/// Label an element, e.g. `button "Save"` or `email input "Email"`.
pub fn identify(doc: &Document, node: NodeId) -> String {
  let Some(tag) = doc.tag_name(node) else {
    return "text".to_string();
  };
  let role = doc
    .attribute(node, "role")
    .map(|r| r.trim().to_ascii_lowercase())
    .filter(|r| !r.is_empty());

  match (tag, role.as_deref()) {
    ("button", _) | (_, Some("button")) => button(doc, node),
    ("a", _) | (_, Some("link")) => link(doc, node),
    ("input", _) => input(doc, node),
    ("select", _) => select(doc, node),
    ("textarea", _) => textarea(doc, node),
    ("h1" | "h2" | "h3" | "h4" | "h5" | "h6", _) => titled(doc, node, tag),
    (_, Some("heading")) => {
      let level = doc
        .attribute(node, "aria-level")
        .and_then(|l| l.trim().parse::<u8>().ok())
        .filter(|l| (1..=6).contains(l));
      let noun = level.map_or_else(|| "heading".to_string(), |l| format!("h{l}"));
      titled(doc, node, &noun)
    }
    ("p", _) => titled(doc, node, "paragraph"),
    ("span" | "code", _) => titled(doc, node, tag),
    ("pre", _) => titled(doc, node, "code block"),
    ("blockquote", _) => titled(doc, node, "quote"),
    ("img", _) => image(doc, node),
    ("svg", _) => svg(doc, node),
    ("video" | "audio" | "canvas", _) => attributed(doc, node, tag).unwrap_or_else(|| tag.to_string()),
    ("iframe", _) => iframe(doc, node),
    ("th", _) => titled(doc, node, "column header"),
    ("td", _) => titled(doc, node, "cell"),
    ("tr", _) => format!("table row {}", doc.element_position(node)),
    ("table", _) => table(doc, node),
    ("li", _) => titled(doc, node, "list item"),
    ("ul" | "ol", _) => list(doc, node, tag),
    ("label", _) => titled(doc, node, "label"),
    ("nav", _) => attributed(doc, node, "navigation").unwrap_or_else(|| "navigation".to_string()),
    ("header" | "footer" | "form", _) => attributed(doc, node, tag).unwrap_or_else(|| tag.to_string()),
    ("main", _) => attributed(doc, node, "main content").unwrap_or_else(|| "main content".to_string()),
    ("aside", _) => attributed(doc, node, "sidebar").unwrap_or_else(|| "sidebar".to_string()),
    ("article" | "section", _) => sectioning(doc, node, tag),
    ("figure", _) => figure(doc, node),
    (_, Some(role)) => generic(doc, node, role),
    _ => generic(doc, node, tag),
  }
}

// === Information sources ===

fn non_empty(s: String) -> Option<String> {
  (!s.is_empty()).then_some(s)
}

fn text_of(doc: &Document, node: NodeId) -> Option<String> {
  non_empty(label_text(doc, node))
}

fn attr_text(doc: &Document, node: NodeId, name: &str) -> Option<String> {
  doc
    .attribute(node, name)
    .map(|v| truncate(&collapse_whitespace(v), LABEL_TEXT_MAX))
    .and_then(non_empty)
}

/// `aria-label`, else the text `aria-labelledby` points at.
fn aria_label(doc: &Document, node: NodeId) -> Option<String> {
  attr_text(doc, node, "aria-label").or_else(|| {
    doc
      .attribute(node, "aria-labelledby")
      .and_then(|ids| resolve_idrefs(doc, ids))
      .map(|t| truncate(&t, LABEL_TEXT_MAX))
  })
}

/// aria-label, title, then name: the attribute sources, bracketed.
fn attributed(doc: &Document, node: NodeId, noun: &str) -> Option<String> {
  aria_label(doc, node)
    .or_else(|| attr_text(doc, node, "title"))
    .map(|label| format!("{noun} [{label}]"))
}

/// Visible text quoted, else attribute sources, else the bare noun.
fn titled(doc: &Document, node: NodeId, noun: &str) -> String {
  text_of(doc, node)
    .map(|text| format!("{noun} \"{text}\""))
    .or_else(|| attributed(doc, node, noun))
    .unwrap_or_else(|| noun.to_string())
}

/// No visible text, but an icon-ish descendant (svg, img, icon font).
fn is_icon_only(doc: &Document, node: NodeId) -> bool {
  if !visible_text(doc, node).is_empty() {
    return false;
  }
  doc.descendants(node).any(|d| match doc.tag_name(d) {
    Some("svg" | "img") => true,
    Some("i" | "span") => doc.class_list(d).iter().any(|c| {
      let c = c.to_ascii_lowercase();
      c.contains("icon") || c == "fa" || c.starts_with("fa-") || c.starts_with("bi-")
    }),
    _ => false,
  })
}

// === Interactive ===

fn button(doc: &Document, node: NodeId) -> String {
  if let Some(text) = text_of(doc, node) {
    return format!("button \"{text}\"");
  }
  if let Some(label) = attributed(doc, node, "button") {
    return label;
  }
  if is_icon_only(doc, node) {
    return "icon button".to_string();
  }
  match doc.attribute(node, "type").map(|t| t.trim().to_ascii_lowercase()) {
    Some(t) if !t.is_empty() && t != "button" => format!("{t} button"),
    _ => "button".to_string(),
  }
}

fn link(doc: &Document, node: NodeId) -> String {
  if let Some(text) = text_of(doc, node) {
    return format!("link \"{text}\"");
  }
  if let Some(label) = attributed(doc, node, "link") {
    return label;
  }
  match doc.attribute(node, "href").and_then(|href| link_target(doc.url(), href)) {
    Some(LinkTarget::SameOrigin(path)) => return format!("link to {path}"),
    Some(LinkTarget::CrossOrigin(host)) => return format!("link to {host}"),
    None => {}
  }
  if is_icon_only(doc, node) {
    "icon link".to_string()
  } else {
    "link".to_string()
  }
}

fn input_noun(input_type: &str) -> &'static str {
  match input_type {
    "email" => "email input",
    "password" => "password input",
    "search" => "search input",
    "tel" => "phone input",
    "url" => "URL input",
    "number" => "number input",
    "date" => "date picker",
    "time" => "time picker",
    "datetime-local" => "date-time picker",
    "month" => "month picker",
    "week" => "week picker",
    "color" => "color picker",
    "file" => "file input",
    "range" => "slider",
    "checkbox" => "checkbox",
    "radio" => "radio button",
    "submit" => "submit button",
    "reset" => "reset button",
    "button" => "button",
    "image" => "image button",
    "hidden" => "hidden input",
    _ => "text input",
  }
}

fn is_form_control(doc: &Document, node: NodeId) -> bool {
  matches!(
    doc.tag_name(node),
    Some("input" | "select" | "textarea" | "button")
  )
}

/// `<label for=…>` text.
fn label_for(doc: &Document, node: NodeId) -> Option<String> {
  let id = doc.id_attr(node)?;
  let label = doc
    .elements()
    .find(|&n| doc.tag_name(n) == Some("label") && doc.attribute(n, "for") == Some(id))?;
  non_empty(truncate(&visible_text(doc, label), LABEL_TEXT_MAX))
}

/// Text of the enclosing `<label>`, minus nested form controls.
fn wrapping_label(doc: &Document, node: NodeId) -> Option<String> {
  let label = doc
    .ancestors(node)
    .find(|&a| doc.tag_name(a) == Some("label"))?;
  let text = visible_text_excluding(doc, label, |n| is_form_control(doc, n));
  non_empty(truncate(&text, LABEL_TEXT_MAX))
}

/// Descriptor chain for form controls: associated label, wrapping label,
/// aria-label, then (optionally) placeholder; name comes last, bracketed.
fn form_control(doc: &Document, node: NodeId, noun: &str, use_placeholder: bool) -> String {
  if let Some(label) = label_for(doc, node).or_else(|| wrapping_label(doc, node)) {
    return format!("{noun} \"{label}\"");
  }
  if let Some(label) = aria_label(doc, node) {
    return format!("{noun} [{label}]");
  }
  if use_placeholder {
    if let Some(placeholder) = attr_text(doc, node, "placeholder") {
      return format!("{noun} \"{placeholder}\"");
    }
  }
  if let Some(name) = attr_text(doc, node, "name") {
    return format!("{noun} [{name}]");
  }
  noun.to_string()
}

fn input(doc: &Document, node: NodeId) -> String {
  let input_type = doc
    .attribute(node, "type")
    .map(|t| t.trim().to_ascii_lowercase())
    .unwrap_or_default();
  let noun = input_noun(&input_type);

  if matches!(input_type.as_str(), "submit" | "reset" | "button" | "image") {
    let caption = attr_text(doc, node, "value").or_else(|| attr_text(doc, node, "alt"));
    if let Some(caption) = caption {
      return format!("{noun} \"{caption}\"");
    }
  }
  form_control(doc, node, noun, true)
}

/// Selects show their current option when nothing labels them.
fn select(doc: &Document, node: NodeId) -> String {
  if let Some(label) = label_for(doc, node).or_else(|| wrapping_label(doc, node)) {
    return format!("dropdown \"{label}\"");
  }
  if let Some(label) = aria_label(doc, node) {
    return format!("dropdown [{label}]");
  }
  if let Some(selected) = text_of(doc, node) {
    return format!("dropdown \"{selected}\"");
  }
  attr_text(doc, node, "name").map_or_else(|| "dropdown".to_string(), |name| format!("dropdown [{name}]"))
}

fn textarea(doc: &Document, node: NodeId) -> String {
  form_control(doc, node, "text area", true)
}

// === Media ===

fn image(doc: &Document, node: NodeId) -> String {
  match doc.attribute(node, "alt").map(str::trim) {
    Some("") => return "decorative image".to_string(),
    Some(alt) => return format!("image \"{}\"", truncate(alt, LABEL_TEXT_MAX)),
    None => {}
  }
  if let Some(label) = attributed(doc, node, "image") {
    return label;
  }
  let file = doc
    .attribute(node, "src")
    .and_then(|src| src.split(['?', '#']).next())
    .and_then(|path| path.rsplit('/').next())
    .filter(|f| !f.is_empty() && !f.starts_with("data:"));
  file.map_or_else(|| "image".to_string(), |f| format!("image ({f})"))
}

fn svg(doc: &Document, node: NodeId) -> String {
  if let Some(label) = aria_label(doc, node) {
    return format!("icon [{label}]");
  }
  let title = doc
    .element_children(node)
    .find(|&c| doc.tag_name(c) == Some("title"))
    .and_then(|t| text_of(doc, t));
  title.map_or_else(|| "icon".to_string(), |t| format!("icon \"{t}\""))
}

fn iframe(doc: &Document, node: NodeId) -> String {
  if let Some(title) = attr_text(doc, node, "title") {
    return format!("iframe \"{title}\"");
  }
  match doc.attribute(node, "src").and_then(|src| link_target(doc.url(), src)) {
    Some(LinkTarget::CrossOrigin(host)) => format!("iframe ({host})"),
    Some(LinkTarget::SameOrigin(path)) => format!("iframe ({path})"),
    None => "iframe".to_string(),
  }
}

// === Structure ===

fn table(doc: &Document, node: NodeId) -> String {
  let caption = doc
    .element_children(node)
    .find(|&c| doc.tag_name(c) == Some("caption"))
    .and_then(|c| text_of(doc, c));
  if let Some(caption) = caption {
    return format!("table \"{caption}\"");
  }
  attributed(doc, node, "table").unwrap_or_else(|| "table".to_string())
}

fn list(doc: &Document, node: NodeId, tag: &str) -> String {
  let noun = if tag == "ol" { "numbered list" } else { "list" };
  if let Some(label) = attributed(doc, node, noun) {
    return label;
  }
  let items = doc
    .element_children(node)
    .filter(|&c| doc.tag_name(c) == Some("li"))
    .count();
  match items {
    0 => noun.to_string(),
    1 => format!("{noun} (1 item)"),
    n => format!("{noun} ({n} items)"),
  }
}

fn first_heading(doc: &Document, node: NodeId) -> Option<String> {
  doc
    .descendants(node)
    .find(|&d| matches!(doc.tag_name(d), Some("h1" | "h2" | "h3" | "h4" | "h5" | "h6")))
    .and_then(|h| text_of(doc, h))
}

fn sectioning(doc: &Document, node: NodeId, tag: &str) -> String {
  if let Some(label) = attributed(doc, node, tag) {
    return label;
  }
  first_heading(doc, node).map_or_else(|| tag.to_string(), |h| format!("{tag} \"{h}\""))
}

fn figure(doc: &Document, node: NodeId) -> String {
  let caption = doc
    .element_children(node)
    .find(|&c| doc.tag_name(c) == Some("figcaption"))
    .and_then(|c| text_of(doc, c));
  caption.map_or_else(
    || attributed(doc, node, "figure").unwrap_or_else(|| "figure".to_string()),
    |c| format!("figure \"{c}\""),
  )
}

/// Generic fallback: full information priority, ending at the noun.
fn generic(doc: &Document, node: NodeId, noun: &str) -> String {
  if let Some(text) = text_of(doc, node) {
    return format!("{noun} \"{text}\"");
  }
  if let Some(label) = attributed(doc, node, noun) {
    return label;
  }
  if let Some(placeholder) = attr_text(doc, node, "placeholder") {
    return format!("{noun} \"{placeholder}\"");
  }
  if let Some(name) = attr_text(doc, node, "name") {
    return format!("{noun} [{name}]");
  }
  if is_icon_only(doc, node) {
    return "icon".to_string();
  }
  noun.to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dom::testing::page;
  use serde_json::json;

  fn label(children: serde_json::Value) -> String {
    let doc = page(children);
    let node = doc.get_element_by_id("t").unwrap();
    identify(&doc, node)
  }

  mod buttons {
    use super::*;

    #[test]
    fn text_wins() {
      assert_eq!(
        label(json!([{"tag": "button", "attrs": {"id": "t", "aria-label": "Persist"}, "children": [" Save  changes "]}])),
        "button \"Save changes\""
      );
    }

    #[test]
    fn aria_label_then_title() {
      assert_eq!(
        label(json!([{"tag": "button", "attrs": {"id": "t", "aria-label": "Close", "title": "x"}}])),
        "button [Close]"
      );
      assert_eq!(
        label(json!([{"tag": "button", "attrs": {"id": "t", "title": "Dismiss"}}])),
        "button [Dismiss]"
      );
    }

    #[test]
    fn icon_only() {
      assert_eq!(
        label(json!([{"tag": "button", "attrs": {"id": "t"}, "children": [{"tag": "svg", "children": [{"tag": "path"}]}]}])),
        "icon button"
      );
    }

    #[test]
    fn typed_and_bare() {
      assert_eq!(label(json!([{"tag": "button", "attrs": {"id": "t", "type": "reset"}}])), "reset button");
      assert_eq!(label(json!([{"tag": "button", "attrs": {"id": "t", "type": "button"}}])), "button");
    }

    #[test]
    fn role_button_on_div() {
      assert_eq!(
        label(json!([{"tag": "div", "attrs": {"id": "t", "role": "button"}, "children": ["Open menu"]}])),
        "button \"Open menu\""
      );
    }

    #[test]
    fn long_text_is_truncated() {
      let text = "Add this product to your shopping cart and continue browsing";
      let out = label(json!([{"tag": "button", "attrs": {"id": "t"}, "children": [text]}]));
      assert_eq!(out, format!("button \"{}...\"", &text[..40].trim_end()));
    }
  }

  mod links {
    use super::*;

    #[test]
    fn text_then_path_then_host() {
      assert_eq!(
        label(json!([{"tag": "a", "attrs": {"id": "t", "href": "/docs"}, "children": ["Docs"]}])),
        "link \"Docs\""
      );
      assert_eq!(
        label(json!([{"tag": "a", "attrs": {"id": "t", "href": "/pricing"}, "children": [{"tag": "svg"}]}])),
        "link to /pricing"
      );
      assert_eq!(
        label(json!([{"tag": "a", "attrs": {"id": "t", "href": "https://github.com/x"}}])),
        "link to github.com"
      );
    }

    #[test]
    fn icon_link_without_href() {
      assert_eq!(
        label(json!([{"tag": "a", "attrs": {"id": "t", "href": "#"}, "children": [{"tag": "i", "attrs": {"class": "fa fa-home"}}]}])),
        "icon link"
      );
      assert_eq!(label(json!([{"tag": "a", "attrs": {"id": "t"}}])), "link");
    }
  }

  mod inputs {
    use super::*;

    #[test]
    fn label_for_wins_over_placeholder() {
      assert_eq!(
        label(json!([
          {"tag": "label", "attrs": {"for": "t"}, "children": ["Email"]},
          {"tag": "input", "attrs": {"type": "email", "id": "t", "placeholder": "you@example.com"}}
        ])),
        "email input \"Email\""
      );
    }

    #[test]
    fn wrapping_label_excludes_the_control() {
      assert_eq!(
        label(json!([{"tag": "label", "children": [
          {"tag": "input", "attrs": {"type": "checkbox", "id": "t"}},
          " Remember me"
        ]}])),
        "checkbox \"Remember me\""
      );
    }

    #[test]
    fn aria_then_placeholder_then_name() {
      assert_eq!(
        label(json!([{"tag": "input", "attrs": {"id": "t", "aria-label": "Query", "placeholder": "Search"}}])),
        "text input [Query]"
      );
      assert_eq!(
        label(json!([{"tag": "input", "attrs": {"id": "t", "type": "search", "placeholder": "Search docs"}}])),
        "search input \"Search docs\""
      );
      assert_eq!(
        label(json!([{"tag": "input", "attrs": {"id": "t", "type": "email", "name": "newsletter"}}])),
        "email input [newsletter]"
      );
      assert_eq!(label(json!([{"tag": "input", "attrs": {"id": "t", "type": "password"}}])), "password input");
    }

    #[test]
    fn submit_uses_value() {
      assert_eq!(
        label(json!([{"tag": "input", "attrs": {"id": "t", "type": "submit", "value": "Send"}}])),
        "submit button \"Send\""
      );
    }

    #[test]
    fn select_and_textarea() {
      assert_eq!(
        label(json!([
          {"tag": "label", "attrs": {"for": "t"}, "children": ["Country"]},
          {"tag": "select", "attrs": {"id": "t"}, "children": [{"tag": "option", "children": ["France"]}]}
        ])),
        "dropdown \"Country\""
      );
      assert_eq!(
        label(json!([{"tag": "select", "attrs": {"id": "t"}, "children": [{"tag": "option", "children": ["France"]}]}])),
        "dropdown \"France\""
      );
      assert_eq!(
        label(json!([{"tag": "textarea", "attrs": {"id": "t", "placeholder": "Your message"}}])),
        "text area \"Your message\""
      );
    }
  }

  mod structure {
    use super::*;

    #[test]
    fn headings_and_text() {
      assert_eq!(label(json!([{"tag": "h2", "attrs": {"id": "t"}, "children": ["Pricing"]}])), "h2 \"Pricing\"");
      assert_eq!(label(json!([{"tag": "p", "attrs": {"id": "t"}}])), "paragraph");
      assert_eq!(
        label(json!([{"tag": "pre", "attrs": {"id": "t"}, "children": ["cargo build"]}])),
        "code block \"cargo build\""
      );
    }

    #[test]
    fn aria_heading_level_must_be_one_to_six() {
      let heading = |level: &str| {
        label(json!([{"tag": "div", "attrs": {"id": "t", "role": "heading", "aria-level": level}, "children": ["Plans"]}]))
      };
      assert_eq!(heading(" 3 "), "h3 \"Plans\"");
      assert_eq!(heading("6"), "h6 \"Plans\"");
      for bad in ["0", "7", "-1", "2.5", "big", "", "999"] {
        assert_eq!(heading(bad), "heading \"Plans\"", "aria-level {bad:?}");
      }
      assert_eq!(
        label(json!([{"tag": "div", "attrs": {"id": "t", "role": "heading"}, "children": ["Plans"]}])),
        "heading \"Plans\""
      );
    }

    #[test]
    fn media() {
      assert_eq!(label(json!([{"tag": "img", "attrs": {"id": "t", "alt": "Team photo"}}])), "image \"Team photo\"");
      assert_eq!(label(json!([{"tag": "img", "attrs": {"id": "t", "alt": ""}}])), "decorative image");
      assert_eq!(
        label(json!([{"tag": "img", "attrs": {"id": "t", "src": "/assets/hero.png?v=2"}}])),
        "image (hero.png)"
      );
      assert_eq!(label(json!([{"tag": "svg", "attrs": {"id": "t"}}])), "icon");
    }

    #[test]
    fn lists_and_tables() {
      assert_eq!(
        label(json!([{"tag": "ul", "attrs": {"id": "t"}, "children": [{"tag": "li"}, {"tag": "li"}]}])),
        "list (2 items)"
      );
      assert_eq!(
        label(json!([{"tag": "table", "attrs": {"id": "t"}, "children": [{"tag": "caption", "children": ["Invoices"]}]}])),
        "table \"Invoices\""
      );
      assert_eq!(label(json!([{"tag": "td", "attrs": {"id": "t"}, "children": ["42"]}])), "cell \"42\"");
    }

    #[test]
    fn landmarks() {
      assert_eq!(
        label(json!([{"tag": "nav", "attrs": {"id": "t", "aria-label": "Main"}}])),
        "navigation [Main]"
      );
      assert_eq!(label(json!([{"tag": "aside", "attrs": {"id": "t"}}])), "sidebar");
      assert_eq!(
        label(json!([{"tag": "section", "attrs": {"id": "t"}, "children": [{"tag": "h3", "children": ["FAQ"]}]}])),
        "section \"FAQ\""
      );
    }

    #[test]
    fn generic_falls_back_to_tag() {
      assert_eq!(label(json!([{"tag": "div", "attrs": {"id": "t"}}])), "div");
      assert_eq!(label(json!([{"tag": "div", "attrs": {"id": "t"}, "children": ["Hello"]}])), "div \"Hello\"");
      assert_eq!(
        label(json!([{"tag": "div", "attrs": {"id": "t", "role": "dialog", "aria-label": "Settings"}}])),
        "dialog [Settings]"
      );
    }
  }
}
