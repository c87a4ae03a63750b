use parking_lot::Mutex;
use parking_lot::MutexGuard;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use tracing::debug;
use tracing::trace;
use triomphe::Arc;

use crate::bus::BusBuilder;
use crate::bus::MessageBus;
use crate::bus::Subscriber;
use crate::raise;
use crate::subsystem::Context;
use crate::subsystem::Lifecycle;
use crate::subsystem::LifecycleError;
use crate::subsystem::Subsystem;
use crate::subsystem::UpdateError;
use crate::task::Task;
use crate::task::TaskHandle;

struct Inner<S> {
  inbox: Option<Subscriber>,
  system: S,
}

/// Drives one [`Subsystem`] through its lifecycle.
///
/// ```text
/// Uninitialized -> Initialized -> Running -> Closed
/// ```
///
/// The manager subscribes the subsystem on construction, wires it to the
/// engine [`Context`] in [`initialize`], and schedules a frame (drain the
/// queue, then run per-frame work) on every [`update`].
///
/// [`initialize`]: Self::initialize
/// [`update`]: Self::update
pub struct Manager<S> {
  state: Lifecycle,
  context: Option<Context>,
  shared: Arc<Mutex<Inner<S>>>,
}

impl<S> Manager<S>
where
  S: Subsystem,
{
  /// Subscribes `system` to its message types on `setup`.
  pub fn new(setup: &mut BusBuilder, system: S) -> Self {
    let inbox: Subscriber = Subscriber::new();

    for kind in S::SUBSCRIPTIONS {
      setup.subscribe(*kind, &inbox);
    }

    Self {
      state: Lifecycle::Uninitialized,
      context: None,
      shared: Arc::new(Mutex::new(Inner {
        inbox: Some(inbox),
        system,
      })),
    }
  }

  /// Returns the current lifecycle state.
  #[inline]
  pub const fn state(&self) -> Lifecycle {
    self.state
  }

  /// Wires the manager to `context` and runs the subsystem's init hook.
  ///
  /// # Panics
  ///
  /// Panics with a `SysInv` exception if the manager was already
  /// initialized.
  pub fn initialize(&mut self, context: &Context) {
    if self.state != Lifecycle::Uninitialized {
      raise!(Error, SysInv, format!("{} subsystem already initialized", S::NAME));
    }

    self.shared.lock().system.on_init(context.bus());
    self.context = Some(context.clone());
    self.state = Lifecycle::Initialized;

    debug!(target: "st_engine", subsystem = S::NAME, "initialized");
  }

  /// Drains the queue on the calling thread.
  ///
  /// # Errors
  ///
  /// Returns [`LifecycleError`] unless the manager is initialized and not
  /// closed.
  pub fn handle_messages(&self) -> Result<(), LifecycleError> {
    let context: &Context = self.active()?;
    let mut inner: MutexGuard<'_, Inner<S>> = self.shared.lock();

    drain(&mut inner, context.bus());

    Ok(())
  }

  /// Schedules one frame without a way to wait on it.
  ///
  /// # Errors
  ///
  /// Returns [`UpdateError`] if the manager is not active or the task
  /// manager rejects the frame.
  pub fn update(&mut self) -> Result<(), UpdateError> {
    let task: Task = self.frame()?;
    let context: &Context = self.active()?;

    context.tasks().submit_detached(task)?;

    Ok(())
  }

  /// Schedules one frame, optionally after `after`, and returns its handle.
  ///
  /// # Errors
  ///
  /// Fails under the same conditions as [`update`].
  ///
  /// [`update`]: Self::update
  pub fn update_tracked(&mut self, after: Option<&TaskHandle>) -> Result<TaskHandle, UpdateError> {
    let mut task: Task = self.frame()?;
    let context: &Context = self.active()?;

    if let Some(handle) = after {
      task = task.after(handle);
    }

    Ok(context.tasks().submit(task)?)
  }

  /// Runs the close hook and drops the subscriber queue.
  ///
  /// Messages still queued are released. Closing twice is a no-op.
  pub fn close(&mut self) {
    if self.state == Lifecycle::Closed {
      return;
    }

    let mut inner: MutexGuard<'_, Inner<S>> = self.shared.lock();

    inner.system.on_close();
    inner.inbox = None;

    drop(inner);

    self.state = Lifecycle::Closed;
    self.context = None;

    debug!(target: "st_engine", subsystem = S::NAME, "closed");
  }

  /// Runs `f` with shared access to the subsystem.
  ///
  /// Blocks while a frame of this subsystem is running.
  #[inline]
  pub fn with<F, R>(&self, f: F) -> R
  where
    F: FnOnce(&S) -> R,
  {
    f(&self.shared.lock().system)
  }

  fn active(&self) -> Result<&Context, LifecycleError> {
    match (self.state, self.context.as_ref()) {
      (Lifecycle::Initialized | Lifecycle::Running, Some(context)) => Ok(context),
      (state, _) => Err(LifecycleError {
        subsystem: S::NAME,
        state,
      }),
    }
  }

  fn frame(&mut self) -> Result<Task, LifecycleError> {
    let bus: Arc<MessageBus> = Arc::clone(self.active()?.bus());
    let shared: Arc<Mutex<Inner<S>>> = Arc::clone(&self.shared);

    self.state = Lifecycle::Running;

    Ok(Task::new(move || {
      let mut inner: MutexGuard<'_, Inner<S>> = shared.lock();

      if drain(&mut inner, &bus) {
        inner.system.on_frame(&bus);
      }
    }))
  }
}

/// Feeds every queued message to the subsystem; `false` once closed.
fn drain<S>(inner: &mut Inner<S>, bus: &MessageBus) -> bool
where
  S: Subsystem,
{
  let Inner { inbox, system } = inner;

  let Some(inbox) = inbox.as_mut() else {
    return false;
  };

  for message in inbox.drain() {
    trace!(
      target: "st_engine",
      subsystem = S::NAME,
      kind = %message.msg_type(),
      "handle",
    );

    system.on_message(&message, bus);
  }

  true
}

impl<S> Debug for Manager<S>
where
  S: Subsystem,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Manager")
      .field("subsystem", &S::NAME)
      .field("state", &self.state)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::panic;
  use std::thread;

  use super::*;
  use crate::bus::Message;
  use crate::bus::MsgPool;
  use crate::bus::MsgType;
  use crate::bus::Payload;
  use crate::engine::EngineConfig;
  use crate::task::TaskManager;

  #[derive(Default)]
  struct Counter {
    inits: usize,
    messages: Vec<i32>,
    frames: usize,
    closed: bool,
  }

  impl Subsystem for Counter {
    const NAME: &'static str = "counter";
    const SUBSCRIPTIONS: &'static [MsgType] = &[MsgType::SetFloor];

    fn on_init(&mut self, _bus: &MessageBus) {
      self.inits += 1;
    }

    fn on_message(&mut self, message: &Message, _bus: &MessageBus) {
      if let Payload::SetFloor(floor) = message.data() {
        self.messages.push(*floor);
      }
    }

    fn on_frame(&mut self, _bus: &MessageBus) {
      self.frames += 1;
    }

    fn on_close(&mut self) {
      self.closed = true;
    }
  }

  fn setup() -> (Manager<Counter>, Context, MsgPool) {
    let pool: MsgPool = MsgPool::with_capacity(64, 64);
    let mut setup: BusBuilder = MessageBus::builder(pool.clone());
    let manager: Manager<Counter> = Manager::new(&mut setup, Counter::default());
    let bus: Arc<MessageBus> = setup.build();
    let mut config: EngineConfig = EngineConfig::new();

    config.worker_threads = 2;

    let tasks: Arc<TaskManager> = Arc::new(TaskManager::new(&config, Arc::clone(&bus)).unwrap());

    (manager, Context::new(bus, tasks), pool)
  }

  #[test]
  fn test_context_debug() {
    let (_manager, context, _pool) = setup();

    assert_eq!(format!("{context:?}"), "Context(..)");
  }

  #[test]
  fn test_lifecycle() {
    let (mut manager, context, pool) = setup();

    assert_eq!(manager.state(), Lifecycle::Uninitialized);
    assert!(manager.update().is_err());

    manager.initialize(&context);
    assert_eq!(manager.state(), Lifecycle::Initialized);

    context.bus().post(Payload::SetFloor(3));
    context.bus().post(Payload::SetFloor(4));

    let handle: TaskHandle = manager.update_tracked(None).unwrap();
    context.tasks().wait(handle);

    assert_eq!(manager.state(), Lifecycle::Running);
    manager.with(|counter| {
      assert_eq!(counter.inits, 1);
      assert_eq!(counter.messages, [3, 4]);
      assert_eq!(counter.frames, 1);
    });

    context.bus().post(Payload::SetFloor(5));
    manager.close();
    manager.close();

    assert_eq!(manager.state(), Lifecycle::Closed);
    assert!(manager.with(|counter| counter.closed));
    assert_eq!(pool.live(), 0);

    let error: UpdateError = manager.update().unwrap_err();

    assert_eq!(
      error,
      UpdateError::Lifecycle(LifecycleError {
        subsystem: "counter",
        state: Lifecycle::Closed,
      }),
    );
    assert!(manager.handle_messages().is_err());
  }

  #[test]
  fn test_double_initialize() {
    let (mut manager, context, _pool) = setup();

    manager.initialize(&context);

    let result: thread::Result<()> =
      panic::catch_unwind(panic::AssertUnwindSafe(|| manager.initialize(&context)));

    assert!(result.is_err());
    assert_eq!(manager.with(|counter| counter.inits), 1);
  }

  #[test]
  fn test_handle_messages_sync() {
    let (mut manager, context, _pool) = setup();

    manager.initialize(&context);
    context.bus().post(Payload::SetFloor(9));
    manager.handle_messages().unwrap();

    manager.with(|counter| {
      assert_eq!(counter.messages, [9]);
      assert_eq!(counter.frames, 0);
    });
  }

  #[test]
  fn test_update_after_tasks_closed() {
    let (mut manager, context, _pool) = setup();

    manager.initialize(&context);
    context.tasks().close();

    assert_eq!(
      manager.update().unwrap_err(),
      UpdateError::Submit(crate::task::SubmitError::Closed),
    );
  }
}
