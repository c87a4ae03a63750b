//! Subsystems reacting to bus messages.
//!
//! Every subsystem implements [`Subsystem`] and is driven by a generic
//! [`Manager`], which owns its subscriber queue, tracks its [`Lifecycle`]
//! and schedules its per-frame work on the task manager.
//!
//! | Subsystem     | Consumes                                   |
//! |---------------|--------------------------------------------|
//! | [`Audio`]     | sound and music commands, asset snapshots   |
//! | [`Physics`]   | gravity, friction, floor, pause, bodies     |
//! | [`Display`]   | fullscreen and brightness                   |
//! | [`Assets`]    | asset load and unload requests              |
//! | [`Renderer`]  | draw commands, render settings, snapshots   |
//! | [`Scripting`] | command scripts                             |
//! | [`Console`]   | log messages                                |

mod assets;
mod audio;
mod console;
mod display;
mod lifecycle;
mod manager;
mod physics;
mod renderer;
mod script;
mod scripting;

use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use triomphe::Arc;

use crate::bus::Message;
use crate::bus::MessageBus;
use crate::bus::MsgType;
use crate::task::TaskManager;

pub use self::assets::Asset;
pub use self::assets::AssetKey;
pub use self::assets::AssetKind;
pub use self::assets::AssetSnapshot;
pub use self::assets::Assets;
pub use self::audio::Audio;
pub use self::audio::AudioState;
pub use self::console::Console;
pub use self::console::LogLevel;
pub use self::console::LogLine;
pub use self::display::Display;
pub use self::display::DisplayState;
pub use self::lifecycle::Lifecycle;
pub use self::lifecycle::LifecycleError;
pub use self::lifecycle::UpdateError;
pub use self::manager::Manager;
pub use self::physics::Physics;
pub use self::physics::PhysicsState;
pub use self::renderer::Renderer;
pub use self::renderer::RendererState;
pub use self::script::Script;
pub use self::script::ScriptError;
pub use self::script::ScriptErrorKind;
pub use self::scripting::Scripting;

// -----------------------------------------------------------------------------
// Context
// -----------------------------------------------------------------------------

/// Shared engine services handed to every manager on initialization.
#[derive(Clone)]
pub struct Context {
  bus: Arc<MessageBus>,
  tasks: Arc<TaskManager>,
}

impl Context {
  #[inline]
  pub fn new(bus: Arc<MessageBus>, tasks: Arc<TaskManager>) -> Self {
    Self { bus, tasks }
  }

  #[inline]
  pub fn bus(&self) -> &Arc<MessageBus> {
    &self.bus
  }

  #[inline]
  pub fn tasks(&self) -> &Arc<TaskManager> {
    &self.tasks
  }
}

impl Debug for Context {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("Context(..)")
  }
}

// -----------------------------------------------------------------------------
// Subsystem
// -----------------------------------------------------------------------------

/// A component driven by bus messages.
///
/// Hooks run on worker threads, one frame at a time: a manager never runs
/// two hooks of the same subsystem concurrently.
pub trait Subsystem: Send + 'static {
  /// Name used in logs and errors.
  const NAME: &'static str;

  /// Message types delivered to this subsystem.
  const SUBSCRIPTIONS: &'static [MsgType];

  /// Runs once when the manager is initialized.
  fn on_init(&mut self, _bus: &MessageBus) {}

  /// Reacts to one delivered message.
  fn on_message(&mut self, message: &Message, bus: &MessageBus);

  /// Runs once per frame after the queued messages were handled.
  fn on_frame(&mut self, _bus: &MessageBus) {}

  /// Runs once when the manager is closed.
  fn on_close(&mut self) {}
}
