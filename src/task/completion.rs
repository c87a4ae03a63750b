use parking_lot::Condvar;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::mem;

use crate::task::Task;

enum State {
  /// Not finished; holds the tasks waiting for it.
  Pending(Vec<Task>),
  Done,
}

/// One-shot completion signal shared by a task and its waiters.
pub(crate) struct Completion {
  state: Mutex<State>,
  signal: Condvar,
}

impl Completion {
  #[inline]
  pub(crate) fn new() -> Self {
    Self {
      state: Mutex::new(State::Pending(Vec::new())),
      signal: Condvar::new(),
    }
  }

  #[inline]
  pub(crate) fn is_done(&self) -> bool {
    matches!(*self.state.lock(), State::Done)
  }

  /// Blocks the calling thread until the completion is signaled.
  pub(crate) fn wait(&self) {
    let mut guard: MutexGuard<'_, State> = self.state.lock();

    while let State::Pending(_) = *guard {
      self.signal.wait(&mut guard);
    }
  }

  /// Parks `task` until the completion is signaled.
  ///
  /// Hands the task back if the completion was already signaled.
  pub(crate) fn defer(&self, task: Task) -> Result<(), Task> {
    match &mut *self.state.lock() {
      State::Pending(parked) => {
        parked.push(task);
        Ok(())
      }
      State::Done => Err(task),
    }
  }

  /// Signals the completion, waking every waiter.
  ///
  /// Returns the tasks that were parked on it. Signaling twice returns an
  /// empty list.
  pub(crate) fn complete(&self) -> Vec<Task> {
    let parked: State = mem::replace(&mut *self.state.lock(), State::Done);

    self.signal.notify_all();

    match parked {
      State::Pending(parked) => parked,
      State::Done => Vec::new(),
    }
  }
}

impl Debug for Completion {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Completion")
      .field("done", &self.is_done())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
