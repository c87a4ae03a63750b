//! The engine orchestrator.
//!
//! [`Engine`] owns the message pool, the bus, the task manager and one
//! manager per subsystem, and drives them one frame at a time:
//!
//! 1. scripting, assets, display, audio and console frames are scheduled
//!    fire-and-forget;
//! 2. the physics frame is scheduled and the renderer frame is scheduled to
//!    run after it;
//! 3. the engine waits for physics and renderer, then checks for `EndGame`.

mod config;

pub use self::config::EngineConfig;
pub use self::config::available_cpus;

use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::time::Duration;
use tracing::Level;
use tracing::Span;
use tracing::debug;
use tracing::info;
use tracing::span;
use tracing::warn;
use triomphe::Arc;

use crate::bus::BusBuilder;
use crate::bus::MessageBus;
use crate::bus::MsgPool;
use crate::bus::MsgType;
use crate::bus::Payload;
use crate::bus::Subscriber;
use crate::consts::SHUTDOWN_WARN_THRESHOLD;
use crate::error::Exception;
use crate::error::ExceptionClass;
use crate::error::ExceptionGroup;
use crate::subsystem::Assets;
use crate::subsystem::Audio;
use crate::subsystem::Console;
use crate::subsystem::Context;
use crate::subsystem::Display as DisplaySystem;
use crate::subsystem::Manager;
use crate::subsystem::Physics;
use crate::subsystem::Renderer;
use crate::subsystem::Scripting;
use crate::subsystem::UpdateError;
use crate::task::TaskHandle;
use crate::task::TaskManager;
use crate::utils::measure_fn;

// -----------------------------------------------------------------------------
// Engine
// -----------------------------------------------------------------------------

/// Owner of every engine component.
pub struct Engine {
  config: EngineConfig,
  pool: MsgPool,
  bus: Arc<MessageBus>,
  tasks: Arc<TaskManager>,
  control: Subscriber,
  running: bool,
  closed: bool,
  frames: u64,
  assets: Manager<Assets>,
  audio: Manager<Audio>,
  console: Manager<Console>,
  display: Manager<DisplaySystem>,
  physics: Manager<Physics>,
  renderer: Manager<Renderer>,
  scripting: Manager<Scripting>,
}

impl Engine {
  /// Builds and initializes every component.
  ///
  /// # Errors
  ///
  /// Returns a `SysCap` [`Exception`] if the worker threads cannot be
  /// started.
  pub fn new(config: EngineConfig) -> Result<Self, Exception> {
    let span: Span = span!(target: "st_engine", Level::DEBUG, "engine::new");

    let pool: MsgPool = MsgPool::with_capacity(config.msg_pool_capacity, config.msg_pool_hard_cap);
    let mut setup: BusBuilder = MessageBus::builder(pool.clone());
    let control: Subscriber = Subscriber::new();

    setup.subscribe(MsgType::EndGame, &control);

    let mut console: Manager<Console> =
      Manager::new(&mut setup, Console::new(config.console_history));
    let mut assets: Manager<Assets> =
      Manager::new(&mut setup, Assets::new(config.asset_root.clone()));
    let mut display: Manager<DisplaySystem> = Manager::new(
      &mut setup,
      DisplaySystem::new(config.display_width, config.display_height),
    );
    let mut audio: Manager<Audio> = Manager::new(&mut setup, Audio::new());
    let mut physics: Manager<Physics> = Manager::new(&mut setup, Physics::new());
    let mut renderer: Manager<Renderer> = Manager::new(&mut setup, Renderer::new());
    let mut scripting: Manager<Scripting> = Manager::new(&mut setup, Scripting::new());

    let bus: Arc<MessageBus> = setup.build();
    let tasks: Arc<TaskManager> = Arc::new(TaskManager::new(&config, Arc::clone(&bus))?);
    let context: Context = Context::new(Arc::clone(&bus), Arc::clone(&tasks));

    console.initialize(&context);
    assets.initialize(&context);
    display.initialize(&context);
    audio.initialize(&context);
    physics.initialize(&context);
    renderer.initialize(&context);
    scripting.initialize(&context);

    debug!(
      target: "st_engine",
      parent: &span,
      workers = tasks.workers(),
      pool = pool.capacity(),
      "initialized",
    );

    Ok(Self {
      config,
      pool,
      bus,
      tasks,
      control,
      running: true,
      closed: false,
      frames: 0,
      assets,
      audio,
      console,
      display,
      physics,
      renderer,
      scripting,
    })
  }

  // ---------------------------------------------------------------------------
  // Accessors
  // ---------------------------------------------------------------------------

  #[inline]
  pub const fn config(&self) -> &EngineConfig {
    &self.config
  }

  #[inline]
  pub const fn pool(&self) -> &MsgPool {
    &self.pool
  }

  #[inline]
  pub const fn bus(&self) -> &Arc<MessageBus> {
    &self.bus
  }

  #[inline]
  pub const fn tasks(&self) -> &Arc<TaskManager> {
    &self.tasks
  }

  /// Returns the number of frames run so far.
  #[inline]
  pub const fn frames(&self) -> u64 {
    self.frames
  }

  /// Returns `false` once `EndGame` was received or the engine was closed.
  #[inline]
  pub const fn is_running(&self) -> bool {
    self.running && !self.closed
  }

  #[inline]
  pub const fn assets(&self) -> &Manager<Assets> {
    &self.assets
  }

  #[inline]
  pub const fn audio(&self) -> &Manager<Audio> {
    &self.audio
  }

  #[inline]
  pub const fn console(&self) -> &Manager<Console> {
    &self.console
  }

  #[inline]
  pub const fn display(&self) -> &Manager<DisplaySystem> {
    &self.display
  }

  #[inline]
  pub const fn physics(&self) -> &Manager<Physics> {
    &self.physics
  }

  #[inline]
  pub const fn renderer(&self) -> &Manager<Renderer> {
    &self.renderer
  }

  #[inline]
  pub const fn scripting(&self) -> &Manager<Scripting> {
    &self.scripting
  }

  // ---------------------------------------------------------------------------
  // Frames
  // ---------------------------------------------------------------------------

  /// Runs one frame.
  ///
  /// # Errors
  ///
  /// Returns [`UpdateError`] if a subsystem frame cannot be scheduled.
  pub fn frame(&mut self) -> Result<(), UpdateError> {
    self.scripting.update()?;
    self.assets.update()?;
    self.display.update()?;
    self.audio.update()?;
    self.console.update()?;

    let physics: TaskHandle = self.physics.update_tracked(None)?;
    let renderer: TaskHandle = self.renderer.update_tracked(Some(&physics))?;

    self.tasks.wait(physics);
    self.tasks.wait(renderer);

    self.frames += 1;
    self.poll_control();

    Ok(())
  }

  /// Runs frames until `EndGame` arrives, or until `limit` frames ran.
  ///
  /// Returns the number of frames run by this call.
  ///
  /// # Errors
  ///
  /// Returns [`UpdateError`] if a subsystem frame cannot be scheduled.
  pub fn run(&mut self, limit: Option<u64>) -> Result<u64, UpdateError> {
    let span: Span = span!(target: "st_engine", Level::DEBUG, "engine::run");
    let start: u64 = self.frames;

    debug!(target: "st_engine", parent: &span, limit = ?limit, "running");

    let (result, elapsed): (Result<(), UpdateError>, Duration) = measure_fn(|| {
      while self.is_running() && limit.is_none_or(|limit| self.frames - start < limit) {
        self.frame()?;
      }

      Ok(())
    });

    debug!(
      target: "st_engine",
      parent: &span,
      frames = self.frames - start,
      elapsed = ?elapsed,
      running = self.is_running(),
      "stopped",
    );

    result.map(|()| self.frames - start)
  }

  /// Runs one frame of every subsystem and waits for all of them.
  ///
  /// Unlike [`frame`], nothing runs fire-and-forget: every message posted
  /// before the call has been handled when it returns.
  ///
  /// # Errors
  ///
  /// Returns [`UpdateError`] if a subsystem frame cannot be scheduled.
  ///
  /// [`frame`]: Self::frame
  pub fn sync(&mut self) -> Result<(), UpdateError> {
    let handles: [TaskHandle; 7] = [
      self.scripting.update_tracked(None)?,
      self.assets.update_tracked(None)?,
      self.display.update_tracked(None)?,
      self.audio.update_tracked(None)?,
      self.console.update_tracked(None)?,
      self.physics.update_tracked(None)?,
      self.renderer.update_tracked(None)?,
    ];

    for handle in handles {
      self.tasks.wait(handle);
    }

    self.poll_control();

    Ok(())
  }

  fn poll_control(&mut self) {
    for message in self.control.drain() {
      if matches!(message.data(), Payload::EndGame) {
        info!(target: "st_engine", frame = self.frames, "end of game requested");
        self.running = false;
      }
    }
  }

  // ---------------------------------------------------------------------------
  // Shutdown
  // ---------------------------------------------------------------------------

  /// Shuts the engine down.
  ///
  /// Waits for every scheduled task, then closes each subsystem. Closing
  /// twice is a no-op.
  pub fn close(&mut self) {
    if self.closed {
      return;
    }

    let span: Span = span!(target: "st_engine", Level::DEBUG, "engine::close");

    debug!(target: "st_engine", parent: &span, pending = self.tasks.pending(), "closing");

    let ((), elapsed): ((), Duration) = measure_fn(|| self.tasks.close());

    if elapsed > SHUTDOWN_WARN_THRESHOLD {
      warn!(target: "st_engine", parent: &span, elapsed = ?elapsed, "slow task shutdown");
    }

    self.scripting.close();
    self.renderer.close();
    self.physics.close();
    self.audio.close();
    self.display.close();
    self.assets.close();
    self.console.close();

    self.control.drain().for_each(drop);

    let leaked: usize = self.pool.live();

    if leaked != 0 {
      warn!(target: "st_engine", parent: &span, leaked, "messages alive after close");
    }

    self.closed = true;

    debug!(
      target: "st_engine",
      parent: &span,
      frames = self.frames,
      elapsed = ?elapsed,
      "closed",
    );
  }
}

impl Drop for Engine {
  fn drop(&mut self) {
    self.close();
  }
}

impl Debug for Engine {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Engine")
      .field("frames", &self.frames)
      .field("running", &self.is_running())
      .field("live", &self.pool.live())
      .finish_non_exhaustive()
  }
}

// -----------------------------------------------------------------------------
// Tracing
// -----------------------------------------------------------------------------

/// Installs the global tracing subscriber configured by `config`.
///
/// # Errors
///
/// Returns a `SysInv` [`Exception`] if a global subscriber is already set.
#[cfg(feature = "tracing")]
pub fn init_tracing(config: &EngineConfig) -> Result<(), Exception> {
  use tracing_subscriber::FmtSubscriber;
  use tracing_subscriber::fmt::format;
  use tracing_subscriber::util::SubscriberInitExt;

  FmtSubscriber::builder()
    .event_format(format().compact())
    .log_internal_errors(true)
    .with_ansi(true)
    .with_file(config.tracing_source_file)
    .with_level(true)
    .with_line_number(config.tracing_source_line)
    .with_max_level(config.tracing_filter())
    .with_target(config.tracing_source_name)
    .with_thread_ids(config.tracing_thread_info)
    .with_thread_names(config.tracing_thread_info)
    .finish()
    .try_init()
    .map_err(error)
}

/// Installs the global tracing subscriber configured by `config`.
///
/// # Errors
///
/// Never fails; the `tracing` feature is disabled.
#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_config: &EngineConfig) -> Result<(), Exception> {
  Ok(())
}

/// Returns a generic `SysInv` exception with the given error message.
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
#[cold]
fn error<E>(error: E) -> Exception
where
  E: Display,
{
  Exception::new(ExceptionClass::Error, ExceptionGroup::SysInv, error)
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::subsystem::Lifecycle;

  fn config() -> EngineConfig {
    let mut config: EngineConfig = EngineConfig::new();

    config.worker_threads = 2;
    config.asset_root = std::env::temp_dir();
    config
  }

  #[test]
  fn test_frames_and_end_game() {
    let mut engine: Engine = Engine::new(config()).unwrap();

    assert_eq!(engine.run(Some(3)).unwrap(), 3);
    assert!(engine.is_running());

    engine.bus().post(Payload::EndGame);
    engine.frame().unwrap();

    assert!(!engine.is_running());
    assert_eq!(engine.run(None).unwrap(), 0);
    assert_eq!(engine.frames(), 4);
  }

  #[test]
  fn test_close_idempotent() {
    let mut engine: Engine = Engine::new(config()).unwrap();

    engine.sync().unwrap();
    engine.close();
    engine.close();

    assert!(!engine.is_running());
    assert!(engine.tasks().is_closed());
    assert_eq!(engine.physics().state(), Lifecycle::Closed);
    assert_eq!(engine.pool().live(), 0);
    assert!(engine.frame().is_err());
  }
}
