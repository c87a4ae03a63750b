use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use triomphe::Arc;

use crate::task::Completion;
use crate::task::Shared;
use crate::task::TaskHandle;
use crate::task::TaskId;

type TaskFn = Box<dyn FnOnce() + Send + 'static>;

/// A unit of work executed once on a worker thread.
///
/// # Examples
///
/// ```
/// use st_engine::task::Task;
///
/// let task: Task = Task::new(|| println!("hello")).affinity(0);
/// ```
pub struct Task {
  pub(crate) func: TaskFn,
  pub(crate) dependency: Option<Arc<Completion>>,
  pub(crate) completion: Option<Arc<Completion>>,
  pub(crate) affinity: Option<usize>,
  pub(crate) id: Option<TaskId>,
  /// Pool that accepted the task; set while parked on a dependency.
  pub(crate) owner: Option<Arc<Shared>>,
}

impl Task {
  /// Creates a task running `func`.
  #[inline]
  pub fn new<F>(func: F) -> Self
  where
    F: FnOnce() + Send + 'static,
  {
    Self {
      func: Box::new(func),
      dependency: None,
      completion: None,
      affinity: None,
      id: None,
      owner: None,
    }
  }

  /// Creates a task calling `func` with `arg`.
  #[inline]
  pub fn from_fn<A>(func: fn(A), arg: A) -> Self
  where
    A: Send + 'static,
  {
    Self::new(move || func(arg))
  }

  /// Delays this task until the task behind `handle` has finished.
  #[inline]
  pub fn after(mut self, handle: &TaskHandle) -> Self {
    self.dependency = Some(Arc::clone(handle.completion()));
    self
  }

  /// Hints which worker should run this task.
  ///
  /// The hint is advisory: the task may run on any worker.
  #[inline]
  pub fn affinity(mut self, worker: usize) -> Self {
    self.affinity = Some(worker);
    self
  }

  /// Returns the identifier assigned on submission.
  #[inline]
  pub const fn id(&self) -> Option<TaskId> {
    self.id
  }

  /// Returns `true` if this task waits for another one.
  #[inline]
  pub fn has_dependency(&self) -> bool {
    self.dependency.is_some()
  }
}

impl Debug for Task {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Task")
      .field("id", &self.id)
      .field("affinity", &self.affinity)
      .field("dependency", &self.dependency.is_some())
      .finish_non_exhaustive()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
