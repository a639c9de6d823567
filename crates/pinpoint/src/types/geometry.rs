/*! Geometry types for viewport and document coordinates. */

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Rectangle bounds. Element bounds are viewport-relative
/// (`getBoundingClientRect` semantics).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Bounds {
  pub x: f64,
  pub y: f64,
  pub w: f64,
  pub h: f64,
}

impl Bounds {
  pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
    Self { x, y, w, h }
  }

  /// Bounds spanned by two arbitrary corners (min/max corrected).
  pub fn from_corners(a: Point, b: Point) -> Self {
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    Self {
      x,
      y,
      w: (a.x - b.x).abs(),
      h: (a.y - b.y).abs(),
    }
  }

  pub fn right(&self) -> f64 {
    self.x + self.w
  }

  pub fn bottom(&self) -> f64 {
    self.y + self.h
  }

  pub fn center(&self) -> Point {
    Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
  }

  /// Edges inclusive.
  pub fn contains(&self, point: Point) -> bool {
    point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
  }

  /// Strict overlap test: touching edges do not intersect.
  pub fn intersects(&self, other: &Bounds) -> bool {
    self.x < other.right() && self.right() > other.x && self.y < other.bottom() && self.bottom() > other.y
  }

  /// Fractional position of `point` inside these bounds, clamped to `[0, 1]`.
  ///
  /// Degenerate axes (zero size) resolve to the centre.
  pub fn fraction_of(&self, point: Point) -> (f64, f64) {
    let fx = if self.w > 0.0 {
      ((point.x - self.x) / self.w).clamp(0.0, 1.0)
    } else {
      0.5
    };
    let fy = if self.h > 0.0 {
      ((point.y - self.y) / self.h).clamp(0.0, 1.0)
    } else {
      0.5
    };
    (fx, fy)
  }

  /// Inverse of [`Bounds::fraction_of`].
  pub fn point_at_fraction(&self, fx: f64, fy: f64) -> Point {
    Point::new(self.x + self.w * fx, self.y + self.h * fy)
  }
}

/// A 2D point.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  pub const fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }

  /// Strictly more than `threshold` away on either axis.
  pub fn moved_from(&self, other: Point, threshold: f64) -> bool {
    (self.x - other.x).abs() > threshold || (self.y - other.y).abs() > threshold
  }

  pub fn offset(&self, dx: f64, dy: f64) -> Point {
    Point::new(self.x + dx, self.y + dy)
  }
}


#[cfg(test)]
mod proptests {
  use super::*;
  use proptest::prelude::*;

  fn coord() -> impl Strategy<Value = f64> {
    -10000.0..10000.0f64
  }

  fn dimension() -> impl Strategy<Value = f64> {
    1.0..5000.0f64
  }

  proptest! {
    /// Corner order never changes the normalized rectangle.
    #[test]
    fn from_corners_symmetric(x1 in coord(), y1 in coord(), x2 in coord(), y2 in coord()) {
      let a = Bounds::from_corners(Point::new(x1, y1), Point::new(x2, y2));
      let b = Bounds::from_corners(Point::new(x2, y2), Point::new(x1, y1));
      prop_assert_eq!(a, b);
      prop_assert!(a.w >= 0.0 && a.h >= 0.0);
    }

    /// Intersection is symmetric.
    #[test]
    fn intersects_symmetric(
      x1 in coord(), y1 in coord(), w1 in dimension(), h1 in dimension(),
      x2 in coord(), y2 in coord(), w2 in dimension(), h2 in dimension()
    ) {
      let a = Bounds::new(x1, y1, w1, h1);
      let b = Bounds::new(x2, y2, w2, h2);
      prop_assert_eq!(a.intersects(&b), b.intersects(&a));
    }

    /// Fractions stay within the unit square and map back inside the bounds.
    #[test]
    fn fraction_roundtrip_stays_inside(
      x in coord(), y in coord(), w in dimension(), h in dimension(),
      px in coord(), py in coord()
    ) {
      let b = Bounds::new(x, y, w, h);
      let (fx, fy) = b.fraction_of(Point::new(px, py));
      prop_assert!((0.0..=1.0).contains(&fx));
      prop_assert!((0.0..=1.0).contains(&fy));
      let p = b.point_at_fraction(fx, fy);
      prop_assert!(p.x >= b.x - 1e-6 && p.x <= b.right() + 1e-6);
      prop_assert!(p.y >= b.y - 1e-6 && p.y <= b.bottom() + 1e-6);
    }
  }
}
