use parking_lot::Mutex;
use parking_lot::MutexGuard;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::thread;
use std::thread::JoinHandle;
use tracing::Level;
use tracing::Span;
use tracing::debug;
use tracing::error;
use tracing::span;
use tracing::warn;
use triomphe::Arc;

use crate::bus::MessageBus;
use crate::core::SlotTable;
use crate::engine::EngineConfig;
use crate::error::Exception;
use crate::error::ExceptionClass;
use crate::error::ExceptionGroup;
use crate::raise;
use crate::task::Completion;
use crate::task::Shared;
use crate::task::SubmitError;
use crate::task::Task;
use crate::task::TaskHandle;
use crate::task::TaskId;
use crate::task::WorkQueue;
use crate::task::worker;
use crate::utils::WorkerId;

/// A fixed pool of worker threads executing [`Task`]s.
///
/// Tasks are taken from a shared lock-free queue in submission order. A task
/// submitted with [`Task::after`] is parked on its dependency and re-queued
/// once the dependency has finished, so waiting never occupies a worker.
///
/// A panicking task does not take its worker down: the panic is logged,
/// reported on the bus as a `LogError` message, and the task counts as
/// finished.
pub struct TaskManager {
  shared: Arc<Shared>,
  threads: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskManager {
  /// Starts `config.worker_threads` workers reporting task failures to
  /// `bus`.
  ///
  /// # Errors
  ///
  /// Returns a `SysCap` exception if a worker thread cannot be spawned.
  pub fn new(config: &EngineConfig, bus: Arc<MessageBus>) -> Result<Self, Exception> {
    let span: Span = span!(target: "st_engine", Level::DEBUG, "task::init");
    let workers: usize = config.worker_threads.max(1);

    let shared: Arc<Shared> = Arc::new(Shared {
      queue: WorkQueue::new(),
      ids: SlotTable::with_capacity(config.task_id_capacity),
      bus,
      pool: WorkerId::next_pool(),
      workers,
    });

    let mut threads: Vec<JoinHandle<()>> = Vec::with_capacity(workers);

    for index in 0..workers {
      let worker: WorkerId = WorkerId::new(shared.pool, index);
      let state: Arc<Shared> = Arc::clone(&shared);

      let spawned: std::io::Result<JoinHandle<()>> = thread::Builder::new()
        .name(worker.thread_name())
        .stack_size(config.worker_stack_size)
        .spawn(move || worker::run(state, worker));

      match spawned {
        Ok(handle) => threads.push(handle),
        Err(error) => {
          error!(target: "st_engine", parent: &span, %error, index, "failed to spawn worker");

          shared.queue.close();

          for handle in threads {
            let _ignore: thread::Result<()> = handle.join();
          }

          return Err(Exception::new(
            ExceptionClass::Error,
            ExceptionGroup::SysCap,
            format!("failed to spawn worker thread: {error}"),
          ));
        }
      }
    }

    debug!(target: "st_engine", parent: &span, workers, "task manager started");

    Ok(Self {
      shared,
      threads: Mutex::new(threads),
    })
  }

  /// Returns the number of worker threads.
  #[inline]
  pub fn workers(&self) -> usize {
    self.shared.workers
  }

  /// Returns the number of tasks waiting in the queue.
  #[inline]
  pub fn pending(&self) -> usize {
    self.shared.queue.len()
  }

  /// Returns the number of submitted tasks that have not finished.
  #[inline]
  pub fn in_flight(&self) -> usize {
    self.shared.ids.len()
  }

  /// Returns `true` once [`close`] has been called.
  ///
  /// [`close`]: Self::close
  #[inline]
  pub fn is_closed(&self) -> bool {
    self.shared.queue.is_closed()
  }

  /// Submits `task` and returns a handle to wait on it.
  ///
  /// # Errors
  ///
  /// Returns [`SubmitError::Closed`] after [`close`] and
  /// [`SubmitError::Capacity`] when every task identifier is in use.
  ///
  /// [`close`]: Self::close
  pub fn submit(&self, mut task: Task) -> Result<TaskHandle, SubmitError> {
    let completion: Arc<Completion> = Arc::new(Completion::new());

    task.completion = Some(Arc::clone(&completion));

    let id: TaskId = self.enqueue(task)?;

    Ok(TaskHandle::new(id, completion))
  }

  /// Submits `task` without a way to wait on it.
  ///
  /// # Errors
  ///
  /// Fails under the same conditions as [`submit`].
  ///
  /// [`submit`]: Self::submit
  pub fn submit_detached(&self, task: Task) -> Result<(), SubmitError> {
    self.enqueue(task).map(|_| ())
  }

  /// Blocks until the task behind `handle` has finished running.
  ///
  /// The handle may come from any manager.
  ///
  /// # Panics
  ///
  /// Panics with a `SysInv` exception if called from one of this manager's
  /// own tasks while the awaited task has not finished, since the waiting
  /// worker could be the one needed to run it.
  pub fn wait(&self, handle: TaskHandle) {
    if !handle.is_complete() && self.is_own_worker() {
      raise!(Error, SysInv, "task manager waited on from its own worker");
    }

    handle.wait();
  }

  /// Stops accepting tasks, runs every task already accepted (including
  /// those parked on a dependency) and joins the workers.
  ///
  /// Calling `close` again, from any thread, waits for the first call to
  /// finish.
  ///
  /// # Panics
  ///
  /// Panics with a `SysInv` exception if called from one of this manager's
  /// own tasks.
  pub fn close(&self) {
    if self.is_own_worker() {
      raise!(Error, SysInv, "task manager closed from its own worker");
    }

    let span: Span = span!(target: "st_engine", Level::DEBUG, "task::close");
    let mut threads: MutexGuard<'_, Vec<JoinHandle<()>>> = self.threads.lock();

    if self.shared.queue.close() {
      debug!(target: "st_engine", parent: &span, pending = self.pending(), "closing");
    }

    for handle in threads.drain(..) {
      if handle.join().is_err() {
        error!(target: "st_engine", parent: &span, "worker thread panicked");
      }
    }
  }

  fn is_own_worker(&self) -> bool {
    WorkerId::current().is_some_and(|worker| worker.pool() == self.shared.pool)
  }

  fn enqueue(&self, mut task: Task) -> Result<TaskId, SubmitError> {
    if self.shared.queue.is_closed() {
      return Err(SubmitError::Closed);
    }

    let Ok(slot) = self.shared.ids.insert() else {
      return Err(SubmitError::Capacity);
    };

    let id: TaskId = TaskId::new(slot);

    if let Some(affinity) = task.affinity.filter(|affinity| *affinity >= self.shared.workers) {
      warn!(
        target: "st_engine",
        task = %id,
        affinity,
        workers = self.shared.workers,
        "task affinity out of range",
      );
    }

    task.id = Some(id);

    match self.shared.queue.push(task) {
      Ok(()) => Ok(id),
      Err(_task) => {
        let _released: bool = self.shared.ids.remove(slot);
        Err(SubmitError::Closed)
      }
    }
  }

  #[cfg(test)]
  fn is_id_live(&self, id: TaskId) -> bool {
    self.shared.ids.exists(id.slot())
  }
}

impl Drop for TaskManager {
  fn drop(&mut self) {
    self.close();
  }
}

impl Debug for TaskManager {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("TaskManager")
      .field("workers", &self.workers())
      .field("pending", &self.pending())
      .field("closed", &self.is_closed())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
