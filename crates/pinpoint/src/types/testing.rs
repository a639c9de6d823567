//! Test fixtures.

use super::{Annotation, AnnotationId, ElementInfo, ElementRect, NearbyContext};
use crate::a11y::AccessibilityInfo;

pub(crate) fn element_info(tag: &str, selector: &str) -> ElementInfo {
  ElementInfo {
    human_readable: tag.to_string(),
    selector_path: selector.to_string(),
    full_dom_path: format!("html > body > {selector}"),
    component_path: None,
    component_framework: None,
    tag_name: tag.to_string(),
    id: None,
    classes: Vec::new(),
    rect: ElementRect::default(),
    accessibility: AccessibilityInfo::default(),
    computed_styles: None,
    nearby_context: NearbyContext::default(),
    inner_text: String::new(),
    attributes: Default::default(),
    is_fixed: false,
  }
}

/// Annotation `n` on a `<button>`, created at `created_at` ms.
pub(crate) fn annotation(n: u32, created_at: i64) -> Annotation {
  Annotation {
    id: AnnotationId::generate(created_at),
    number: n,
    comment: format!("comment {n}"),
    element_info: element_info("button", &format!("#b{n}")),
    element: None,
    created_at,
    updated_at: created_at,
    selected_text: None,
    is_multi_select: false,
    click_x: 10.0,
    click_y: 20.0,
    offset_x: 0.5,
    offset_y: 0.5,
    context: None,
  }
}
