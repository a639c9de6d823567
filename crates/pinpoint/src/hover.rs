/*!
Hover tracking: which element is under the pointer, and what to call it.

Pointer moves are throttled so fast movement does not re-run hit testing and
identification on every event.
*/

use std::time::{Duration, Instant};

use crate::dom::Document;
use crate::identity::identify;
use crate::throttle::Throttle;
use crate::types::{Bounds, NodeId, Point};

/// Minimum spacing between hit tests.
pub const HOVER_THROTTLE: Duration = Duration::from_millis(50);

/// The element currently under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverTarget {
  /// Hovered element.
  pub element: NodeId,
  /// Short human-readable name, as shown in the tooltip.
  pub label: String,
  /// Viewport-relative.
  pub rect: Bounds,
}

/// Throttled pointer-to-element resolution.
#[derive(Debug, Clone)]
pub struct HoverTracker {
  throttle: Throttle<Point>,
  current: Option<HoverTarget>,
}

impl Default for HoverTracker {
  fn default() -> Self {
    Self::new(HOVER_THROTTLE)
  }
}

impl HoverTracker {
  /// Tracker that hit-tests at most once per `interval`.
  pub const fn new(interval: Duration) -> Self {
    Self {
      throttle: Throttle::new(interval),
      current: None,
    }
  }

  /// Element under the pointer as of the last resolved move.
  pub const fn current(&self) -> Option<&HoverTarget> {
    self.current.as_ref()
  }

  /// Pointer moved to `at`. True if the hover target changed.
  pub fn pointer_moved(&mut self, doc: &Document, at: Point, now: Instant) -> bool {
    match self.throttle.call(at, now) {
      Some(point) => self.resolve(doc, point),
      None => false,
    }
  }

  /// Deliver a coalesced trailing move, if due. True if the target changed.
  pub fn tick(&mut self, doc: &Document, now: Instant) -> bool {
    match self.throttle.poll(now) {
      Some(point) => self.resolve(doc, point),
      None => false,
    }
  }

  /// When [`HoverTracker::tick`] next has work.
  pub fn deadline(&self) -> Option<Instant> {
    self.throttle.deadline()
  }

  /// Pointer left the page.
  pub fn clear(&mut self) -> bool {
    self.throttle.cancel();
    self.current.take().is_some()
  }

  fn resolve(&mut self, doc: &Document, at: Point) -> bool {
    let element = doc
      .element_at(at)
      .filter(|&n| n != doc.root() && n != doc.body());

    if element == self.current.as_ref().map(|t| t.element) {
      return false;
    }
    self.current = element.map(|element| HoverTarget {
      element,
      label: identify(doc, element),
      rect: doc.rect(element),
    });
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dom::testing::page;
  use serde_json::json;

  const MS: Duration = Duration::from_millis(1);

  fn doc() -> Document {
    page(json!([
      {"tag": "button", "attrs": {"id": "save"}, "rect": {"x": 0.0, "y": 0.0, "w": 100.0, "h": 40.0}, "children": ["Save"]},
      {"tag": "a", "attrs": {"id": "docs", "href": "/docs"}, "rect": {"x": 200.0, "y": 0.0, "w": 100.0, "h": 40.0}, "children": ["Docs"]}
    ]))
  }

  #[test]
  fn first_move_identifies_immediately() {
    let doc = doc();
    let mut hover = HoverTracker::default();
    assert!(hover.pointer_moved(&doc, Point::new(10.0, 10.0), Instant::now()));
    let target = hover.current().unwrap();
    assert_eq!(target.label, "button \"Save\"");
    assert_eq!(target.rect, Bounds::new(0.0, 0.0, 100.0, 40.0));
  }

  #[test]
  fn fast_moves_coalesce_to_trailing_edge() {
    let doc = doc();
    let mut hover = HoverTracker::default();
    let start = Instant::now();
    hover.pointer_moved(&doc, Point::new(10.0, 10.0), start);
    assert!(!hover.pointer_moved(&doc, Point::new(120.0, 10.0), start + 5 * MS));
    assert!(!hover.pointer_moved(&doc, Point::new(210.0, 10.0), start + 10 * MS));
    assert_eq!(hover.current().unwrap().label, "button \"Save\"");

    assert_eq!(hover.deadline(), Some(start + HOVER_THROTTLE));
    assert!(hover.tick(&doc, start + HOVER_THROTTLE));
    assert_eq!(hover.current().unwrap().label, "link \"Docs\"");
  }

  #[test]
  fn same_element_is_not_a_change() {
    let doc = doc();
    let mut hover = HoverTracker::new(Duration::ZERO);
    let now = Instant::now();
    assert!(hover.pointer_moved(&doc, Point::new(10.0, 10.0), now));
    assert!(!hover.pointer_moved(&doc, Point::new(20.0, 20.0), now));
  }

  #[test]
  fn empty_space_and_clear() {
    let doc = doc();
    let mut hover = HoverTracker::new(Duration::ZERO);
    let now = Instant::now();
    hover.pointer_moved(&doc, Point::new(10.0, 10.0), now);
    assert!(hover.pointer_moved(&doc, Point::new(150.0, 500.0), now));
    assert!(hover.current().is_none());
    assert!(!hover.clear());
  }
}
