/*!
Implicit ARIA roles.

Maps tag names (and `<input type>`) to the role a browser exposes when no
explicit `role` attribute is present. Simplified from the HTML-AAM tables:
context-dependent cases (`header` inside `article`, unlabeled `section`)
resolve to their common role.
*/

/// Tags that are semantic landmarks or sectioning anchors.
pub const LANDMARK_TAGS: &[&str] = &[
  "nav", "header", "footer", "main", "aside", "article", "section", "form", "figure",
];

/// Implicit role for an element.
///
/// `input_type` is the lowercased `type` attribute (inputs and buttons);
/// `has_href` matters for `a` and `area`.
pub fn implicit_role(tag: &str, input_type: Option<&str>, has_href: bool) -> Option<&'static str> {
  let role = match tag {
    "a" | "area" if has_href => "link",
    "button" => "button",
    "input" => return input_role(input_type.unwrap_or("text")),
    "select" => "combobox",
    "textarea" => "textbox",
    "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
    "img" => "img",
    "nav" => "navigation",
    "main" => "main",
    "header" => "banner",
    "footer" => "contentinfo",
    "aside" => "complementary",
    "article" => "article",
    "section" => "region",
    "form" => "form",
    "dialog" => "dialog",
    "ul" | "ol" | "menu" => "list",
    "li" => "listitem",
    "table" => "table",
    "thead" | "tbody" | "tfoot" => "rowgroup",
    "tr" => "row",
    "td" => "cell",
    "th" => "columnheader",
    "p" => "paragraph",
    "figure" => "figure",
    "hr" => "separator",
    "progress" => "progressbar",
    "meter" => "meter",
    "option" => "option",
    "fieldset" | "details" => "group",
    "output" => "status",
    _ => return None,
  };
  Some(role)
}

fn input_role(input_type: &str) -> Option<&'static str> {
  let role = match input_type {
    "button" | "submit" | "reset" | "image" => "button",
    "checkbox" => "checkbox",
    "radio" => "radio",
    "range" => "slider",
    "number" => "spinbutton",
    "search" => "searchbox",
    "text" | "email" | "tel" | "url" | "" => "textbox",
    _ => return None,
  };
  Some(role)
}

/// Landmark roles used for "containing landmark" context.
pub fn is_landmark_role(role: &str) -> bool {
  matches!(
    role,
    "navigation"
      | "main"
      | "banner"
      | "contentinfo"
      | "complementary"
      | "region"
      | "form"
      | "search"
      | "article"
  )
}

/// Can the element receive keyboard focus without a `tabindex`?
pub fn is_natively_focusable(tag: &str, input_type: Option<&str>, has_href: bool) -> bool {
  match tag {
    "a" | "area" => has_href,
    "input" => input_type != Some("hidden"),
    "button" | "select" | "textarea" | "summary" | "iframe" => true,
    _ => false,
  }
}
