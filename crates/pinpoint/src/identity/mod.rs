/*!
Element identity: human-readable labels, selector paths, `ElementInfo`
collection and re-finding persisted elements.

- `classes.rs` - build-hash stripping and utility-class ranking
- `identifier.rs` - [`identify`]
- `selector_path.rs` - [`generate`] / [`generate_full_path`]
- `collector.rs` - [`collect_element_info`]
- `refinder.rs` - [`refind`]
*/

mod classes;
mod collector;
mod identifier;
mod refinder;
mod selector_path;

pub use classes::{clean_class, clean_classes, is_utility_class, meaningful_class};
pub use collector::collect_element_info;
pub use identifier::identify;
pub use refinder::refind;
pub use selector_path::{direct_selector, generate, generate_full_path};

use url::Url;

/// Where a link points, relative to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LinkTarget {
  /// Same origin: the resolved path.
  SameOrigin(String),
  /// Different origin: the host.
  CrossOrigin(String),
}

/// Resolve `href` against the page URL. `None` for fragments, scripts and
/// non-http schemes.
pub(crate) fn link_target(page_url: &str, href: &str) -> Option<LinkTarget> {
  let href = href.trim();
  if href.is_empty() || href.starts_with('#') {
    return None;
  }

  let base = Url::parse(page_url).ok();
  let resolved = match base {
    Some(ref base) => base.join(href).ok()?,
    None => Url::parse(href).ok()?,
  };
  if !matches!(resolved.scheme(), "http" | "https") {
    return None;
  }

  if base.is_some_and(|b| b.origin() == resolved.origin()) {
    Some(LinkTarget::SameOrigin(resolved.path().to_string()))
  } else {
    resolved
      .host_str()
      .map(|host| LinkTarget::CrossOrigin(host.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const PAGE: &str = "https://example.com/app/page";

  #[test]
  fn relative_links_are_same_origin() {
    assert_eq!(
      link_target(PAGE, "/pricing"),
      Some(LinkTarget::SameOrigin("/pricing".into()))
    );
    assert_eq!(
      link_target(PAGE, "settings?tab=1"),
      Some(LinkTarget::SameOrigin("/app/settings".into()))
    );
    assert_eq!(
      link_target(PAGE, "https://example.com/docs"),
      Some(LinkTarget::SameOrigin("/docs".into()))
    );
  }

  #[test]
  fn other_hosts_are_cross_origin() {
    assert_eq!(
      link_target(PAGE, "https://github.com/org/repo"),
      Some(LinkTarget::CrossOrigin("github.com".into()))
    );
  }

  #[test]
  fn ignores_fragments_and_scripts() {
    assert_eq!(link_target(PAGE, "#top"), None);
    assert_eq!(link_target(PAGE, "javascript:void(0)"), None);
    assert_eq!(link_target(PAGE, "mailto:a@b.c"), None);
  }
}
