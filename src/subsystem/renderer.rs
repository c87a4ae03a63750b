use std::mem;
use tracing::trace;
use triomphe::Arc;

use crate::bus::DrawCmd;
use crate::bus::Message;
use crate::bus::MessageBus;
use crate::bus::MsgType;
use crate::bus::Payload;
use crate::consts::DEFAULT_DISPLAY_HEIGHT;
use crate::consts::DEFAULT_DISPLAY_WIDTH;
use crate::subsystem::AssetKind;
use crate::subsystem::AssetSnapshot;
use crate::subsystem::Subsystem;

/// Observable state of the [`Renderer`] subsystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RendererState {
  pub vsync: bool,
  pub internal_width: u32,
  pub internal_height: u32,
  pub show_fps: bool,
  pub darkness: u8,
  pub lighting: bool,
  /// Frames presented so far.
  pub frames: u64,
  /// Draw list of the last presented frame, ordered by layer.
  pub last_frame: Vec<DrawCmd>,
  /// Draw commands dropped because the texture was not loaded.
  pub skipped: u64,
}

impl Default for RendererState {
  fn default() -> Self {
    Self {
      vsync: true,
      internal_width: DEFAULT_DISPLAY_WIDTH,
      internal_height: DEFAULT_DISPLAY_HEIGHT,
      show_fps: false,
      darkness: 0,
      lighting: false,
      frames: 0,
      last_frame: Vec::new(),
      skipped: 0,
    }
  }
}

/// Collects draw commands and presents them once per frame.
#[derive(Debug, Default)]
pub struct Renderer {
  state: RendererState,
  pending: Vec<DrawCmd>,
  assets: Option<Arc<AssetSnapshot>>,
}

impl Renderer {
  #[inline]
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub const fn state(&self) -> &RendererState {
    &self.state
  }

  fn draw(&mut self, command: DrawCmd) {
    let loaded: bool = self
      .assets
      .as_ref()
      .is_some_and(|assets| assets.contains_kind(command.texture, AssetKind::Texture));

    if loaded {
      self.pending.push(command);
    } else {
      trace!(target: "st_engine", texture = %command.texture, "skip draw");
      self.state.skipped += 1;
    }
  }
}

impl Subsystem for Renderer {
  const NAME: &'static str = "renderer";

  const SUBSCRIPTIONS: &'static [MsgType] = &[
    MsgType::DrawTexture,
    MsgType::SetVsync,
    MsgType::SetInternalResolution,
    MsgType::ShowFps,
    MsgType::SetDarkness,
    MsgType::EnableLighting,
    MsgType::Assets,
  ];

  fn on_message(&mut self, message: &Message, _bus: &MessageBus) {
    match message.data() {
      Payload::DrawTexture(command) => self.draw(*command),
      Payload::SetVsync(vsync) => self.state.vsync = *vsync,
      Payload::SetInternalResolution { width, height } => {
        self.state.internal_width = *width;
        self.state.internal_height = *height;
      }
      Payload::ShowFps(show) => self.state.show_fps = *show,
      Payload::SetDarkness(darkness) => self.state.darkness = *darkness,
      Payload::EnableLighting(lighting) => self.state.lighting = *lighting,
      Payload::Assets(snapshot) => self.assets = Some(Arc::clone(snapshot)),
      _ => {}
    }
  }

  /// Presents the pending draw list.
  fn on_frame(&mut self, _bus: &MessageBus) {
    let mut frame: Vec<DrawCmd> = mem::take(&mut self.pending);

    frame.sort_by_key(|command| command.layer);

    self.state.last_frame = frame;
    self.state.frames += 1;
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
