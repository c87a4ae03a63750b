use std::any::Any;
use std::panic;
use std::panic::AssertUnwindSafe;
use tracing::Level;
use tracing::Span;
use tracing::debug;
use tracing::error;
use tracing::span;
use tracing::trace;
use triomphe::Arc;

use crate::bus::MessageBus;
use crate::bus::Payload;
use crate::core::SlotTable;
use crate::task::Task;
use crate::task::TaskId;
use crate::task::WorkQueue;
use crate::utils::WorkerId;

/// State shared by the task manager and its workers.
pub(crate) struct Shared {
  pub(crate) queue: WorkQueue,
  pub(crate) ids: SlotTable,
  pub(crate) bus: Arc<MessageBus>,
  pub(crate) pool: u32,
  pub(crate) workers: usize,
}

/// Body of a worker thread: runs tasks until the queue is closed and every
/// accepted task has finished.
pub(crate) fn run(shared: Arc<Shared>, worker: WorkerId) {
  let span: Span = span!(target: "st_engine", Level::DEBUG, "worker", index = worker.index());

  worker.bind();

  debug!(target: "st_engine", parent: &span, "started");

  while let Some(task) = shared.queue.pop() {
    execute(&shared, worker, task, &span);
  }

  debug!(target: "st_engine", parent: &span, "stopped");
}

fn execute(shared: &Arc<Shared>, worker: WorkerId, mut task: Task, span: &Span) {
  if let Some(dependency) = task.dependency.take() {
    task.owner = Some(Arc::clone(shared));

    match dependency.defer(task) {
      Ok(()) => {
        trace!(target: "st_engine", parent: span, "task parked on dependency");
        return;
      }
      Err(ready) => task = ready,
    }
  }

  let Task {
    func,
    completion,
    affinity,
    id,
    ..
  } = task;

  if let Some(affinity) = affinity.filter(|affinity| *affinity != worker.index()) {
    trace!(
      target: "st_engine",
      parent: span,
      task = ?id,
      affinity,
      "task running off its preferred worker",
    );
  }

  if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(func)) {
    shared.report_panic(id, panic.as_ref(), span);
  }

  if let Some(id) = id {
    shared.ids.remove(id.slot());
  }

  // Dependents go back to the pool that accepted them, which may not be
  // this one.
  if let Some(completion) = completion {
    for mut parked in completion.complete() {
      match parked.owner.take() {
        Some(owner) => owner.queue.requeue(parked),
        None => shared.queue.requeue(parked),
      }
    }
  }

  shared.queue.finish();
}

impl Shared {
  fn report_panic(&self, id: Option<TaskId>, panic: &(dyn Any + Send), span: &Span) {
    let reason: &str = panic_message(panic);

    error!(target: "st_engine", parent: span, task = ?id, reason, "task panicked");

    let text: String = match id {
      Some(id) => format!("task {id} panicked: {reason}"),
      None => format!("task panicked: {reason}"),
    };

    self.bus.post(Payload::LogError(text));
  }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
  if let Some(message) = panic.downcast_ref::<&'static str>() {
    message
  } else if let Some(message) = panic.downcast_ref::<String>() {
    message.as_str()
  } else {
    "unknown panic payload"
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
