/*!
Drag-to-select: a rectangle gesture that picks several elements at once.

[`DragSelector`] tracks the pointer; [`select_elements`] turns a finished
rectangle into annotation targets.
*/

use std::sync::LazyLock;

use crate::dom::{Document, Selector};
use crate::types::{Bounds, NodeId, Point};

/// Pointer travel (px, either axis) before a press becomes a drag.
pub const DRAG_THRESHOLD: f64 = 8.0;
/// Finished rectangles smaller than this on both axes count as clicks.
pub const MIN_SELECTION_SPAN: f64 = 20.0;

/// Elements a drag can pick.
pub const CANDIDATE_SELECTOR: &str = "button, a, input, img, p, h1, h2, h3, h4, h5, h6, li, label, td, th";

/// Fractions of the viewport beyond which an element is a layout region, not a target.
const COARSE_WIDTH_RATIO: f64 = 0.8;
const COARSE_HEIGHT_RATIO: f64 = 0.5;
const MIN_ELEMENT_SIZE: f64 = 10.0;

static CANDIDATES: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse(CANDIDATE_SELECTOR).expect("BUG: invalid CANDIDATE_SELECTOR literal"));

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum DragState {
  #[default]
  Idle,
  Pressed { start: Point },
  Dragging { start: Point, current: Point },
}

/// Pointer state machine for the selection rectangle (viewport coordinates).
#[derive(Debug, Clone, Copy, Default)]
pub struct DragSelector {
  state: DragState,
}

impl DragSelector {
  /// Idle selector.
  pub fn new() -> Self {
    Self::default()
  }

  /// Pointer pressed at `at`. Not a drag until it moves past [`DRAG_THRESHOLD`].
  pub fn press(&mut self, at: Point) {
    self.state = DragState::Pressed { start: at };
  }

  /// Pointer moved. Returns the live rectangle once dragging.
  pub fn move_to(&mut self, at: Point) -> Option<Bounds> {
    self.state = match self.state {
      DragState::Idle => return None,
      DragState::Pressed { start } if !at.moved_from(start, DRAG_THRESHOLD) => return None,
      DragState::Pressed { start } | DragState::Dragging { start, .. } => DragState::Dragging { start, current: at },
    };
    self.selection()
  }

  /// Pointer released. Returns the finished rectangle, or `None` for a click.
  pub fn release(&mut self, at: Point) -> Option<Bounds> {
    let state = std::mem::take(&mut self.state);
    let DragState::Dragging { start, .. } = state else {
      return None;
    };
    let rect = Bounds::from_corners(start, at);
    (rect.w >= MIN_SELECTION_SPAN || rect.h >= MIN_SELECTION_SPAN).then_some(rect)
  }

  /// Abandon the gesture (e.g. Escape).
  pub fn cancel(&mut self) {
    self.state = DragState::Idle;
  }

  /// True once the press has become a drag.
  pub fn is_dragging(&self) -> bool {
    matches!(self.state, DragState::Dragging { .. })
  }

  /// Current normalized rectangle while dragging.
  pub fn selection(&self) -> Option<Bounds> {
    match self.state {
      DragState::Dragging { start, current } => Some(Bounds::from_corners(start, current)),
      DragState::Idle | DragState::Pressed { .. } => None,
    }
  }
}

/// Elements a selection rectangle should annotate, in document order.
///
/// Candidates intersecting `rect` are kept unless they span most of the
/// viewport or are tiny. Of what remains, only leaves are returned: an
/// element containing another survivor is dropped.
pub fn select_elements(doc: &Document, rect: Bounds) -> Vec<NodeId> {
  let viewport = doc.viewport();
  let max_w = viewport.width * COARSE_WIDTH_RATIO;
  let max_h = viewport.height * COARSE_HEIGHT_RATIO;

  let survivors: Vec<NodeId> = doc
    .select_all(&CANDIDATES)
    .into_iter()
    .filter(|&node| {
      let r = doc.rect(node);
      let too_coarse = r.w > max_w && r.h > max_h;
      let too_fine = r.w < MIN_ELEMENT_SIZE || r.h < MIN_ELEMENT_SIZE;
      !too_coarse && !too_fine && r.intersects(&rect)
    })
    .collect();

  survivors
    .iter()
    .copied()
    .filter(|&node| !survivors.iter().any(|&other| other != node && doc.contains(node, other)))
    .collect()
}
