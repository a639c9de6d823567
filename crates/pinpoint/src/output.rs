/*!
Markdown export of annotations.

Each output level adds to the one below it:

- compact: number, label, comment
- standard: selector and selected text
- detailed: classes, position, component, nearby context, key styles
- forensic: full DOM path, accessibility, full style diff, timestamps
*/

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat};

use crate::dom::Document;
use crate::style::contextual_styles;
use crate::types::{Annotation, OutputLevel};

fn timestamp(ms: i64) -> String {
  DateTime::from_timestamp_millis(ms).map_or_else(
    || ms.to_string(),
    |t| t.to_rfc3339_opts(SecondsFormat::Secs, true),
  )
}

fn styles_line(label: &str, styles: &BTreeMap<String, String>) -> Option<String> {
  if styles.is_empty() {
    return None;
  }
  let body = styles
    .iter()
    .map(|(k, v)| format!("{k}: {v}"))
    .collect::<Vec<_>>()
    .join("; ");
  Some(format!("**{label}:** `{body}`"))
}

/// Render `annotations` as markdown at `level`.
///
/// With `doc`, live styles are read from elements that are still attached;
/// without it only stored data is used. Returns an empty string when there is
/// nothing to export.
pub fn render(annotations: &[Annotation], level: OutputLevel, doc: Option<&Document>) -> String {
  if annotations.is_empty() {
    return String::new();
  }

  let mut lines = Vec::new();
  match doc {
    Some(doc) => lines.push(format!("## Page Feedback: {}", doc.url())),
    None => lines.push("## Page Feedback".to_string()),
  }
  if level >= OutputLevel::Detailed {
    if let Some(doc) = doc {
      let viewport = doc.viewport();
      lines.push(format!("**Viewport:** {}x{}", viewport.width, viewport.height));
    }
  }
  lines.push(String::new());

  if level == OutputLevel::Compact {
    lines.extend(annotations.iter().map(|a| {
      format!("{}. **{}**: {}", a.number, a.element_info.human_readable, a.comment)
    }));
  } else {
    for a in annotations {
      lines.extend(section(a, level, doc));
      lines.push(String::new());
    }
  }

  let mut out = lines.join("\n");
  out.truncate(out.trim_end().len());
  out.push('\n');
  out
}

fn section(a: &Annotation, level: OutputLevel, doc: Option<&Document>) -> Vec<String> {
  let info = &a.element_info;
  let mut lines = vec![format!("### {}. {}", a.number, info.human_readable)];

  lines.push(format!("**Location:** `{}`", info.selector_path));
  if let Some(text) = &a.selected_text {
    lines.push(format!("**Selected text:** \"{text}\""));
  }

  if level >= OutputLevel::Detailed {
    if !info.classes.is_empty() {
      lines.push(format!("**Classes:** {}", info.classes.join(", ")));
    }
    let r = &info.rect;
    lines.push(format!(
      "**Position:** {}, {} ({}x{}){}",
      r.left.round(),
      r.top.round(),
      r.width.round(),
      r.height.round(),
      if info.is_fixed { ", fixed" } else { "" }
    ));
    if let Some(component) = &info.component_path {
      match &info.component_framework {
        Some(framework) => lines.push(format!("**Component:** {component} ({framework})")),
        None => lines.push(format!("**Component:** {component}")),
      }
    }
    let nearby = &info.nearby_context;
    let context: Vec<String> = [
      ("in", &nearby.containing_landmark),
      ("parent", &nearby.parent),
      ("after", &nearby.previous_sibling),
      ("before", &nearby.next_sibling),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.as_ref().map(|v| format!("{label} {v}")))
    .collect();
    if !context.is_empty() {
      lines.push(format!("**Context:** {}", context.join("; ")));
    }
    if level == OutputLevel::Detailed {
      let live = doc.and_then(|d| a.element.filter(|&n| d.is_connected(n)).map(|n| (d, n)));
      if let Some((doc, node)) = live {
        lines.extend(styles_line("Styles", &contextual_styles(doc, node)));
      }
    }
  }

  if level == OutputLevel::Forensic {
    lines.push(format!("**DOM path:** `{}`", info.full_dom_path));
    let a11y = &info.accessibility;
    let mut parts = vec![format!("role {}", a11y.role.as_deref().unwrap_or("none"))];
    if let Some(label) = &a11y.aria_label {
      parts.push(format!("aria-label \"{label}\""));
    }
    if let Some(index) = a11y.tab_index {
      parts.push(format!("tabindex {index}"));
    }
    parts.push(if a11y.is_interactive { "interactive" } else { "not interactive" }.to_string());
    lines.push(format!("**Accessibility:** {}", parts.join(", ")));
    if !info.attributes.is_empty() {
      let attrs: Vec<String> = info.attributes.iter().map(|(k, v)| format!("{k}=\"{v}\"")).collect();
      lines.push(format!("**Attributes:** `{}`", attrs.join(" ")));
    }
    if let Some(styles) = &info.computed_styles {
      lines.extend(styles_line("Computed styles", styles));
    }
    lines.push(format!(
      "**Click:** {}, {} (offset {:.2}, {:.2})",
      a.click_x.round(),
      a.click_y.round(),
      a.offset_x,
      a.offset_y
    ));
    lines.push(format!("**Created:** {}", timestamp(a.created_at)));
    if a.updated_at != a.created_at {
      lines.push(format!("**Updated:** {}", timestamp(a.updated_at)));
    }
  }

  lines.push(format!("**Feedback:** {}", a.comment));
  lines
}
