use std::cell::Cell;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

thread_local! {
  static CURRENT: Cell<Option<WorkerId>> = const { Cell::new(None) };
}

/// Identity of a task manager worker thread.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub(crate) struct WorkerId {
  pool: u32,
  index: usize,
}

impl WorkerId {
  /// Returns a fresh identifier for a new pool of workers.
  #[inline]
  pub(crate) fn next_pool() -> u32 {
    static ID: AtomicU32 = AtomicU32::new(1);
    ID.fetch_add(1, Ordering::Relaxed)
  }

  #[inline]
  pub(crate) const fn new(pool: u32, index: usize) -> Self {
    Self { pool, index }
  }

  /// Returns the identity of the calling thread, if it is a worker.
  #[inline]
  pub(crate) fn current() -> Option<Self> {
    CURRENT.try_with(Cell::get).ok().flatten()
  }

  /// Marks the calling thread as this worker.
  #[inline]
  pub(crate) fn bind(self) {
    CURRENT.set(Some(self));
  }

  #[inline]
  pub(crate) const fn pool(&self) -> u32 {
    self.pool
  }

  #[inline]
  pub(crate) const fn index(&self) -> usize {
    self.index
  }

  /// Returns the OS thread name used for this worker.
  #[inline]
  pub(crate) fn thread_name(&self) -> String {
    format!("st-worker-{:0>2}", self.index)
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
