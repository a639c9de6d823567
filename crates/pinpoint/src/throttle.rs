/*!
Leading- and trailing-edge throttle over an explicit clock.

The first call in a quiet period fires immediately. Calls inside the interval
are coalesced; the latest one fires on the trailing edge, which the owner
collects with [`Throttle::poll`] (driven by its own timer or event loop).
*/

use std::time::{Duration, Instant};

/// Rate limiter that keeps the latest value offered while limited.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
  interval: Duration,
  last_fire: Option<Instant>,
  pending: Option<T>,
}

impl<T> Throttle<T> {
  /// Fire at most once per `interval`.
  pub const fn new(interval: Duration) -> Self {
    Self {
      interval,
      last_fire: None,
      pending: None,
    }
  }

  /// Minimum spacing between fires.
  pub const fn interval(&self) -> Duration {
    self.interval
  }

  fn ready(&self, now: Instant) -> bool {
    self
      .last_fire
      .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
  }

  /// Offer `value` at `now`. Returns it if it fires on the leading edge;
  /// otherwise it replaces any pending trailing value.
  pub fn call(&mut self, value: T, now: Instant) -> Option<T> {
    if self.ready(now) {
      self.last_fire = Some(now);
      self.pending = None;
      Some(value)
    } else {
      self.pending = Some(value);
      None
    }
  }

  /// Trailing edge: the latest coalesced value, once the interval has passed.
  pub fn poll(&mut self, now: Instant) -> Option<T> {
    if self.pending.is_some() && self.ready(now) {
      self.last_fire = Some(now);
      self.pending.take()
    } else {
      None
    }
  }

  /// When the pending trailing value becomes due.
  pub fn deadline(&self) -> Option<Instant> {
    self.pending.as_ref()?;
    self.last_fire.map(|last| last + self.interval)
  }

  /// True while a trailing value waits for [`Throttle::poll`].
  pub fn has_pending(&self) -> bool {
    self.pending.is_some()
  }

  /// Drop any pending trailing value.
  pub fn cancel(&mut self) {
    self.pending = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const MS: Duration = Duration::from_millis(1);

  #[test]
  fn leading_edge_fires_immediately() {
    let mut t = Throttle::new(50 * MS);
    let start = Instant::now();
    assert_eq!(t.call(1, start), Some(1));
    assert_eq!(t.call(2, start + 10 * MS), None);
    assert_eq!(t.call(3, start + 20 * MS), None);
    assert_eq!(t.deadline(), Some(start + 50 * MS));
  }

  #[test]
  fn trailing_edge_delivers_latest() {
    let mut t = Throttle::new(50 * MS);
    let start = Instant::now();
    t.call(1, start);
    t.call(2, start + 10 * MS);
    t.call(3, start + 20 * MS);
    assert_eq!(t.poll(start + 30 * MS), None, "not yet due");
    assert_eq!(t.poll(start + 50 * MS), Some(3));
    assert_eq!(t.poll(start + 200 * MS), None, "delivered once");
  }

  #[test]
  fn trailing_fire_restarts_the_window() {
    let mut t = Throttle::new(50 * MS);
    let start = Instant::now();
    t.call(1, start);
    t.call(2, start + 10 * MS);
    t.poll(start + 50 * MS);
    assert_eq!(t.call(3, start + 60 * MS), None);
    assert_eq!(t.call(4, start + 100 * MS), Some(4));
    assert!(!t.has_pending());
  }

  #[test]
  fn cancel_drops_trailing() {
    let mut t = Throttle::new(50 * MS);
    let start = Instant::now();
    t.call(1, start);
    t.call(2, start + MS);
    t.cancel();
    assert_eq!(t.poll(start + 100 * MS), None);
    assert_eq!(t.deadline(), None);
  }
}
