/*!
Debounced background writer.

`schedule` replaces the pending snapshot and pushes the deadline out by the
debounce window, so a burst of edits collapses into one write after the burst
ends. Snapshots carry the revision they were taken at; one older than the
newest revision already accepted is ignored, so racing callers can never put
a stale set back in the queue. `flush` writes immediately; `destroy` (and drop) cancels without writing.
*/

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::AnnotationStore;
use crate::types::Annotation;

/// Quiet period before a scheduled save is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Default)]
struct Pending {
  snapshot: Option<Vec<Annotation>>,
  /// Newest revision accepted so far, written or not.
  revision: u64,
  deadline: Option<Instant>,
  shutdown: bool,
}

struct Shared {
  store: Arc<AnnotationStore>,
  pending: Mutex<Pending>,
  wake: Condvar,
  /// Serializes writes so an older snapshot never lands after a newer one.
  write: Mutex<()>,
}

impl Shared {
  /// Take the pending snapshot (if any) and write it.
  fn write_pending(&self) -> bool {
    let _write = self.write.lock();
    let snapshot = {
      let mut pending = self.pending.lock();
      pending.deadline = None;
      pending.snapshot.take()
    };
    snapshot.map_or(true, |annotations| self.store.save(&annotations))
  }
}

/// Handle to the auto-save worker thread. Cancels on drop.
pub struct AutoSaver {
  shared: Arc<Shared>,
  window: Duration,
  thread: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for AutoSaver {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AutoSaver")
      .field("window", &self.window)
      .finish_non_exhaustive()
  }
}

impl AutoSaver {
  /// Start the worker thread. If it cannot be spawned, only `flush` writes.
  pub fn new(store: Arc<AnnotationStore>, window: Duration) -> Self {
    let shared = Arc::new(Shared {
      store,
      pending: Mutex::new(Pending::default()),
      wake: Condvar::new(),
      write: Mutex::new(()),
    });

    let worker = Arc::clone(&shared);
    let thread = thread::Builder::new()
      .name("pinpoint-autosave".to_string())
      .spawn(move || run(&worker));

    let thread = match thread {
      Ok(handle) => Some(handle),
      Err(e) => {
        log::error!("Failed to start auto-save thread, saves will only happen on flush: {e}");
        None
      }
    };

    Self {
      shared,
      window,
      thread: Mutex::new(thread),
    }
  }

  /// Store snapshots are written to.
  pub fn store(&self) -> &Arc<AnnotationStore> {
    &self.shared.store
  }

  /// Queue `annotations`, taken at `revision`, for writing once the debounce
  /// window passes quietly. Returns false if the snapshot was ignored because
  /// a newer one was already accepted or the saver is destroyed.
  pub fn schedule(&self, revision: u64, annotations: Vec<Annotation>) -> bool {
    let mut pending = self.shared.pending.lock();
    if pending.shutdown {
      return false;
    }
    if revision < pending.revision {
      log::debug!("Ignoring stale auto-save snapshot {revision} (have {})", pending.revision);
      return false;
    }
    pending.revision = revision;
    pending.snapshot = Some(annotations);
    pending.deadline = Some(Instant::now() + self.window);
    self.shared.wake.notify_one();
    true
  }

  /// True while a snapshot is waiting to be written.
  pub fn has_pending(&self) -> bool {
    self.shared.pending.lock().snapshot.is_some()
  }

  /// Write any pending snapshot now. True unless the write failed.
  pub fn flush(&self) -> bool {
    self.shared.write_pending()
  }

  /// Cancel any pending write and stop the worker. Idempotent.
  pub fn destroy(&self) {
    {
      let mut pending = self.shared.pending.lock();
      pending.shutdown = true;
      pending.snapshot = None;
      pending.deadline = None;
      self.shared.wake.notify_one();
    }
    if let Some(thread) = self.thread.lock().take() {
      drop(thread.join());
    }
  }
}

impl Drop for AutoSaver {
  fn drop(&mut self) {
    self.destroy();
  }
}

fn run(shared: &Shared) {
  let mut pending = shared.pending.lock();
  loop {
    if pending.shutdown {
      return;
    }
    match pending.deadline {
      None => shared.wake.wait(&mut pending),
      Some(deadline) if Instant::now() >= deadline => {
        drop(pending);
        shared.write_pending();
        pending = shared.pending.lock();
      }
      Some(deadline) => {
        shared.wake.wait_until(&mut pending, deadline);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::persistence::{MemoryStorage, Storage};
  use crate::types::testing::annotation;
  use crate::types::PinpointResult;
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// Counts writes on top of in-memory storage.
  #[derive(Default)]
  struct CountingStorage {
    inner: MemoryStorage,
    writes: AtomicUsize,
  }

  impl Storage for CountingStorage {
    fn get(&self, key: &str) -> PinpointResult<Option<String>> {
      self.inner.get(key)
    }
    fn set(&self, key: &str, value: &str) -> PinpointResult<()> {
      self.writes.fetch_add(1, Ordering::SeqCst);
      self.inner.set(key, value)
    }
    fn remove(&self, key: &str) -> PinpointResult<()> {
      self.inner.remove(key)
    }
    fn keys(&self) -> PinpointResult<Vec<String>> {
      self.inner.keys()
    }
  }

  fn saver(window_ms: u64) -> (Arc<CountingStorage>, AutoSaver) {
    let storage = Arc::new(CountingStorage::default());
    let store = Arc::new(AnnotationStore::new(storage.clone(), "o"));
    (storage, AutoSaver::new(store, Duration::from_millis(window_ms)))
  }

  #[test]
  fn burst_collapses_into_one_write() {
    let (storage, saver) = saver(50);
    for n in 1..=5 {
      saver.schedule(u64::from(n), (1..=n).map(|i| annotation(i, 0)).collect());
    }
    thread::sleep(Duration::from_millis(300));

    assert_eq!(storage.writes.load(Ordering::SeqCst), 1);
    assert_eq!(saver.store().load_at(0).len(), 5);
    assert!(!saver.has_pending());
  }

  #[test]
  fn flush_writes_immediately() {
    let (storage, saver) = saver(60_000);
    saver.schedule(1, vec![annotation(1, 0)]);
    assert!(saver.flush());
    assert_eq!(storage.writes.load(Ordering::SeqCst), 1);
    assert!(saver.flush(), "nothing pending");
    assert_eq!(storage.writes.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn older_revision_never_replaces_newer() {
    let (_, saver) = saver(60_000);
    assert!(saver.schedule(3, vec![annotation(1, 0), annotation(2, 0)]));
    assert!(!saver.schedule(2, vec![annotation(1, 0)]));
    assert!(saver.flush());
    assert_eq!(saver.store().load_at(0).len(), 2);

    // Still rejected once the newer snapshot has been written.
    assert!(!saver.schedule(1, Vec::new()));
    assert!(!saver.has_pending());
    assert!(saver.schedule(3, vec![annotation(1, 0)]), "same revision is accepted");
  }

  #[test]
  fn destroy_cancels_without_writing() {
    let (storage, saver) = saver(20);
    saver.schedule(1, vec![annotation(1, 0)]);
    saver.destroy();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(storage.writes.load(Ordering::SeqCst), 0);

    assert!(!saver.schedule(2, vec![annotation(2, 0)]));
    assert!(!saver.has_pending(), "destroyed saver ignores schedules");
  }

  #[test]
  fn drop_cancels_without_writing() {
    let (storage, saver) = saver(20);
    saver.schedule(1, vec![annotation(1, 0)]);
    drop(saver);
    thread::sleep(Duration::from_millis(100));
    assert_eq!(storage.writes.load(Ordering::SeqCst), 0);
  }
}
