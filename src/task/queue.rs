use crossbeam_queue::SegQueue;
use parking_lot::Condvar;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::core::fatal;
use crate::task::Task;

struct Permits {
  count: usize,
  /// Accepted tasks that have not finished, queued or parked.
  live: usize,
  closed: bool,
}

/// Lock-free task queue paired with a counting "work available" signal.
///
/// Each queued task is matched by one permit. A consumer takes a permit
/// before popping, so a pop holding a permit always finds a task.
///
/// Closing stops new pushes, but consumers keep running until every accepted
/// task has been reported through [`finish`], including tasks parked on a
/// dependency outside the queue.
///
/// [`finish`]: Self::finish
pub(crate) struct WorkQueue {
  tasks: SegQueue<Task>,
  permits: Mutex<Permits>,
  signal: Condvar,
}

impl WorkQueue {
  #[inline]
  pub(crate) fn new() -> Self {
    Self {
      tasks: SegQueue::new(),
      permits: Mutex::new(Permits {
        count: 0,
        live: 0,
        closed: false,
      }),
      signal: Condvar::new(),
    }
  }

  /// Enqueues `task`, handing it back if the queue is closed.
  pub(crate) fn push(&self, task: Task) -> Result<(), Task> {
    let mut permits: MutexGuard<'_, Permits> = self.permits.lock();

    if permits.closed {
      return Err(task);
    }

    self.tasks.push(task);
    permits.count += 1;
    permits.live += 1;

    drop(permits);
    self.signal.notify_one();

    Ok(())
  }

  /// Enqueues `task` even if the queue is closed.
  ///
  /// Used for tasks that were accepted before closing and parked on a
  /// dependency since.
  pub(crate) fn requeue(&self, task: Task) {
    let mut permits: MutexGuard<'_, Permits> = self.permits.lock();

    self.tasks.push(task);
    permits.count += 1;

    drop(permits);
    self.signal.notify_one();
  }

  /// Marks one accepted task as finished.
  pub(crate) fn finish(&self) {
    let mut permits: MutexGuard<'_, Permits> = self.permits.lock();

    permits.live = permits.live.saturating_sub(1);

    if permits.closed && permits.live == 0 {
      drop(permits);
      self.signal.notify_all();
    }
  }

  /// Blocks until a task is available and dequeues it.
  ///
  /// Returns `None` once the queue is closed and every accepted task has
  /// finished.
  pub(crate) fn pop(&self) -> Option<Task> {
    let mut permits: MutexGuard<'_, Permits> = self.permits.lock();

    loop {
      if permits.count > 0 {
        permits.count -= 1;
        break;
      }

      if permits.closed && permits.live == 0 {
        return None;
      }

      self.signal.wait(&mut permits);
    }

    drop(permits);

    let Some(task) = self.tasks.pop() else {
      fatal!("work queue permit without a queued task");
    };

    Some(task)
  }

  /// Closes the queue and wakes every blocked consumer.
  ///
  /// Returns `false` if the queue was already closed.
  pub(crate) fn close(&self) -> bool {
    let mut permits: MutexGuard<'_, Permits> = self.permits.lock();

    if permits.closed {
      return false;
    }

    permits.closed = true;

    drop(permits);
    self.signal.notify_all();

    true
  }

  #[inline]
  pub(crate) fn is_closed(&self) -> bool {
    self.permits.lock().closed
  }

  /// Returns the number of accepted tasks that have not finished.
  #[inline]
  pub(crate) fn live(&self) -> usize {
    self.permits.lock().live
  }

  /// Returns the number of queued tasks.
  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.tasks.len()
  }
}

impl Debug for WorkQueue {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("WorkQueue")
      .field("len", &self.len())
      .field("closed", &self.is_closed())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::sync::Arc;
  use std::sync::atomic::AtomicUsize;
  use std::sync::atomic::Ordering;
  use std::thread;
  use std::thread::JoinHandle;

  use super::*;

  #[test]
  fn test_push_pop() {
    let queue: WorkQueue = WorkQueue::new();

    assert!(queue.push(Task::new(|| {})).is_ok());
    assert_eq!(queue.len(), 1);
    assert!(queue.pop().is_some());
    assert_eq!(queue.len(), 0);
  }

  #[test]
  fn test_closed_rejects_push() {
    let queue: WorkQueue = WorkQueue::new();

    assert!(queue.close());
    assert!(!queue.close());
    assert!(queue.is_closed());
    assert!(queue.push(Task::new(|| {})).is_err());
    assert!(queue.pop().is_none());
  }

  #[test]
  fn test_closed_drains_first() {
    let queue: WorkQueue = WorkQueue::new();

    queue.push(Task::new(|| {})).unwrap();
    queue.push(Task::new(|| {})).unwrap();

    // Taken off the queue as if parked on a dependency.
    let parked: Task = queue.pop().unwrap();

    queue.close();
    queue.requeue(parked);

    assert!(queue.pop().is_some());
    assert!(queue.pop().is_some());

    queue.finish();
    queue.finish();

    assert_eq!(queue.live(), 0);
    assert!(queue.pop().is_none());
  }

  #[test]
  fn test_close_wakes_consumers() {
    let queue: Arc<WorkQueue> = Arc::new(WorkQueue::new());
    let popped: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));

    let consumers: Vec<JoinHandle<()>> = (0..4)
      .map(|_| {
        let queue: Arc<WorkQueue> = Arc::clone(&queue);
        let popped: Arc<AtomicUsize> = Arc::clone(&popped);

        thread::spawn(move || {
          while queue.pop().is_some() {
            popped.fetch_add(1, Ordering::Relaxed);
            queue.finish();
          }
        })
      })
      .collect();

    for _ in 0..100 {
      queue.push(Task::new(|| {})).unwrap();
    }

    queue.close();

    for consumer in consumers {
      consumer.join().unwrap();
    }

    assert_eq!(popped.load(Ordering::Relaxed), 100);
  }

  #[test]
  fn test_close_waits_for_live_tasks() {
    let queue: Arc<WorkQueue> = Arc::new(WorkQueue::new());

    queue.push(Task::new(|| {})).unwrap();

    let parked: Task = queue.pop().unwrap();

    queue.close();

    let consumer: JoinHandle<usize> = {
      let queue: Arc<WorkQueue> = Arc::clone(&queue);

      thread::spawn(move || {
        let mut popped: usize = 0;

        while queue.pop().is_some() {
          popped += 1;
          queue.finish();
        }

        popped
      })
    };

    queue.requeue(parked);

    assert_eq!(consumer.join().unwrap(), 1);
    assert_eq!(queue.live(), 0);
  }
}
