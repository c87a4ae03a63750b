use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use triomphe::Arc;

use crate::core::SlotId;
use crate::task::Completion;

// -----------------------------------------------------------------------------
// Task Id
// -----------------------------------------------------------------------------

/// Identifier of an in-flight task.
///
/// Identifiers are recycled once a task finishes; a recycled identifier
/// carries a new generation and never equals the one it replaces.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TaskId {
  slot: SlotId,
}

impl TaskId {
  #[inline]
  pub(crate) const fn new(slot: SlotId) -> Self {
    Self { slot }
  }

  #[inline]
  pub(crate) const fn slot(self) -> SlotId {
    self.slot
  }

  /// Returns the raw numeric value of this identifier.
  #[inline]
  pub const fn into_bits(self) -> u64 {
    self.slot.into_bits()
  }
}

impl Debug for TaskId {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Display::fmt(self, f)
  }
}

impl Display for TaskId {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "#Task<{}>", self.slot.serial())
  }
}

// -----------------------------------------------------------------------------
// Task Handle
// -----------------------------------------------------------------------------

/// Completion handle of a submitted task.
///
/// Returned by [`TaskManager::submit`]; pass it to [`TaskManager::wait`] to
/// block until the task has run, or to [`Task::after`] to order another task
/// behind it.
///
/// [`TaskManager::submit`]: crate::task::TaskManager::submit
/// [`TaskManager::wait`]: crate::task::TaskManager::wait
/// [`Task::after`]: crate::task::Task::after
pub struct TaskHandle {
  id: TaskId,
  completion: Arc<Completion>,
}

impl TaskHandle {
  #[inline]
  pub(crate) const fn new(id: TaskId, completion: Arc<Completion>) -> Self {
    Self { id, completion }
  }

  /// Returns the identifier the task was submitted under.
  #[inline]
  pub const fn id(&self) -> TaskId {
    self.id
  }

  /// Returns `true` if the task has finished running.
  #[inline]
  pub fn is_complete(&self) -> bool {
    self.completion.is_done()
  }

  /// Blocks the calling thread until the task has finished running.
  #[inline]
  pub fn wait(self) {
    self.completion.wait();
  }

  #[inline]
  pub(crate) fn completion(&self) -> &Arc<Completion> {
    &self.completion
  }
}

impl Debug for TaskHandle {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("TaskHandle")
      .field("id", &self.id)
      .field("complete", &self.is_complete())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
