use tracing::debug;

use crate::bus::Message;
use crate::bus::MessageBus;
use crate::bus::MsgType;
use crate::bus::Payload;
use crate::subsystem::Subsystem;

/// Observable state of the [`Display`] subsystem.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayState {
  pub width: u32,
  pub height: u32,
  pub fullscreen: bool,
  /// Window brightness in `0.0..=1.0`.
  pub brightness: f32,
}

/// Window state and screen geometry.
#[derive(Debug)]
pub struct Display {
  state: DisplayState,
}

impl Display {
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      state: DisplayState {
        width,
        height,
        fullscreen: false,
        brightness: 1.0,
      },
    }
  }

  #[inline]
  pub const fn state(&self) -> &DisplayState {
    &self.state
  }
}

impl Subsystem for Display {
  const NAME: &'static str = "display";

  const SUBSCRIPTIONS: &'static [MsgType] = &[MsgType::SetFullscreen, MsgType::SetWindowBrightness];

  /// Announces the screen geometry.
  fn on_init(&mut self, bus: &MessageBus) {
    let DisplayState { width, height, .. } = self.state;

    bus.post(Payload::RealScreenCoordinates { width, height });
    bus.post(Payload::LogInfo(format!(
      "Current screen resolution is {width}x{height}"
    )));
  }

  fn on_message(&mut self, message: &Message, bus: &MessageBus) {
    match message.data() {
      Payload::SetFullscreen(fullscreen) => {
        debug!(target: "st_engine", fullscreen, "set fullscreen");

        self.state.fullscreen = *fullscreen;
        bus.post(Payload::FullscreenStatus(*fullscreen));
      }
      Payload::SetWindowBrightness(brightness) => {
        let brightness: f32 = if brightness.is_nan() {
          self.state.brightness
        } else {
          brightness.clamp(0.0, 1.0)
        };

        self.state.brightness = brightness;
        bus.post(Payload::LogSuccess(format!("Brightness set to: {brightness}")));
      }
      _ => {}
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
