use tracing::trace;

use crate::bus::BodyDesc;
use crate::bus::Message;
use crate::bus::MessageBus;
use crate::bus::MsgType;
use crate::bus::Payload;
use crate::consts::PHYSICS_INIT_FLOOR;
use crate::consts::PHYSICS_INIT_FRICTION;
use crate::consts::PHYSICS_INIT_GRAVITY;
use crate::subsystem::Subsystem;

/// Observable state of the [`Physics`] subsystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhysicsState {
  pub gravity: i8,
  pub friction: i8,
  /// Lowest position bodies fall to while gravity pulls them down.
  pub floor: i32,
  pub paused: bool,
  pub bodies: Vec<BodyDesc>,
  /// Number of simulation steps run so far.
  pub steps: u64,
}

impl Default for PhysicsState {
  fn default() -> Self {
    Self {
      gravity: PHYSICS_INIT_GRAVITY,
      friction: PHYSICS_INIT_FRICTION,
      floor: PHYSICS_INIT_FLOOR,
      paused: false,
      bodies: Vec::new(),
      steps: 0,
    }
  }
}

impl PhysicsState {
  /// Advances every body by one step.
  ///
  /// Velocity moves a body, friction slows horizontal motion toward zero,
  /// and gravity accelerates vertical motion. With positive gravity a body
  /// never sinks below the floor.
  pub fn step(&mut self) {
    let friction: i16 = i16::from(self.friction).max(0);
    let gravity: i16 = i16::from(self.gravity);

    for body in self.bodies.iter_mut() {
      body.x = body.x.saturating_add(i32::from(body.velocity_x));
      body.velocity_x = match body.velocity_x {
        velocity if velocity > 0 => (velocity - friction).max(0),
        velocity if velocity < 0 => (velocity + friction).min(0),
        _ => 0,
      };

      body.velocity_y = body.velocity_y.saturating_add(gravity);
      body.y = body.y.saturating_add(i32::from(body.velocity_y));

      if gravity > 0 && body.y > self.floor {
        body.y = self.floor;
        body.velocity_y = 0;
      }
    }

    self.steps += 1;
  }
}

/// Fixed-step body simulation.
#[derive(Debug, Default)]
pub struct Physics {
  state: PhysicsState,
}

impl Physics {
  #[inline]
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub const fn state(&self) -> &PhysicsState {
    &self.state
  }
}

impl Subsystem for Physics {
  const NAME: &'static str = "physics";

  const SUBSCRIPTIONS: &'static [MsgType] = &[
    MsgType::SetGravity,
    MsgType::SetFriction,
    MsgType::SetFloor,
    MsgType::PausePhysics,
    MsgType::UnpausePhysics,
    MsgType::SpawnBody,
  ];

  fn on_message(&mut self, message: &Message, _bus: &MessageBus) {
    match message.data() {
      Payload::SetGravity(gravity) => self.state.gravity = *gravity,
      Payload::SetFriction(friction) => self.state.friction = *friction,
      Payload::SetFloor(floor) => self.state.floor = *floor,
      Payload::PausePhysics => self.state.paused = true,
      Payload::UnpausePhysics => self.state.paused = false,
      Payload::SpawnBody(body) => self.state.bodies.push(*body),
      _ => {}
    }
  }

  fn on_frame(&mut self, _bus: &MessageBus) {
    if self.state.paused {
      return;
    }

    self.state.step();

    trace!(
      target: "st_engine",
      step = self.state.steps,
      bodies = self.state.bodies.len(),
      "physics step",
    );
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
