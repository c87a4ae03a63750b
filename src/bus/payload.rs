use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;
use triomphe::Arc;

use crate::subsystem::AssetKey;
use crate::subsystem::AssetSnapshot;

// -----------------------------------------------------------------------------
// Payload Records
// -----------------------------------------------------------------------------

/// A request to start playing a sound or music track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoundCmd {
  /// Asset the audio data is stored under.
  pub id: AssetKey,
  /// Playback volume, clamped to `consts::AUDIO_MAX_VOLUME`.
  pub volume: u8,
  /// Extra repetitions; `-1` loops forever.
  pub loops: i8,
}

/// A request to draw a texture during the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCmd {
  pub texture: AssetKey,
  pub x: i32,
  pub y: i32,
  /// Draw order; lower layers are drawn first.
  pub layer: u8,
}

/// Initial state of a physics body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BodyDesc {
  pub x: i32,
  pub y: i32,
  pub velocity_x: i16,
  pub velocity_y: i16,
}

// -----------------------------------------------------------------------------
// Payload
// -----------------------------------------------------------------------------

/// The data carried by a [`Message`], one variant per message type.
///
/// The variant determines the message's [`MsgType`]; there is no way to
/// construct a message whose type and data disagree.
///
/// [`Message`]: crate::bus::Message
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Payload {
  // ---------------------------------------------------------------------------
  // Audio
  // ---------------------------------------------------------------------------
  PlaySound(SoundCmd),
  PlayMusic(SoundCmd),
  StopMusic,
  PauseMusic,
  StopAllSounds,
  SetAudioEnabled(bool),
  SetMusicVolume(u8),
  SetSoundsVolume(u8),
  // ---------------------------------------------------------------------------
  // Physics
  // ---------------------------------------------------------------------------
  SetGravity(i8),
  SetFriction(i8),
  SetFloor(i32),
  PausePhysics,
  UnpausePhysics,
  SpawnBody(BodyDesc),
  // ---------------------------------------------------------------------------
  // Display
  // ---------------------------------------------------------------------------
  SetFullscreen(bool),
  SetWindowBrightness(f32),
  FullscreenStatus(bool),
  RealScreenCoordinates { width: u32, height: u32 },
  // ---------------------------------------------------------------------------
  // Assets
  // ---------------------------------------------------------------------------
  LoadAsset(String),
  UnloadAsset(String),
  Assets(Arc<AssetSnapshot>),
  // ---------------------------------------------------------------------------
  // Renderer
  // ---------------------------------------------------------------------------
  DrawTexture(DrawCmd),
  SetVsync(bool),
  SetInternalResolution { width: u32, height: u32 },
  ShowFps(bool),
  SetDarkness(u8),
  EnableLighting(bool),
  // ---------------------------------------------------------------------------
  // Scripting
  // ---------------------------------------------------------------------------
  RunScript(String),
  // ---------------------------------------------------------------------------
  // Console
  // ---------------------------------------------------------------------------
  LogInfo(String),
  LogSuccess(String),
  LogWarning(String),
  LogError(String),
  ConsoleClear,
  // ---------------------------------------------------------------------------
  // Game
  // ---------------------------------------------------------------------------
  EndGame,
}

impl Payload {
  /// Returns the message type this payload is routed under.
  pub const fn msg_type(&self) -> MsgType {
    match self {
      Self::PlaySound(_) => MsgType::PlaySound,
      Self::PlayMusic(_) => MsgType::PlayMusic,
      Self::StopMusic => MsgType::StopMusic,
      Self::PauseMusic => MsgType::PauseMusic,
      Self::StopAllSounds => MsgType::StopAllSounds,
      Self::SetAudioEnabled(_) => MsgType::SetAudioEnabled,
      Self::SetMusicVolume(_) => MsgType::SetMusicVolume,
      Self::SetSoundsVolume(_) => MsgType::SetSoundsVolume,
      Self::SetGravity(_) => MsgType::SetGravity,
      Self::SetFriction(_) => MsgType::SetFriction,
      Self::SetFloor(_) => MsgType::SetFloor,
      Self::PausePhysics => MsgType::PausePhysics,
      Self::UnpausePhysics => MsgType::UnpausePhysics,
      Self::SpawnBody(_) => MsgType::SpawnBody,
      Self::SetFullscreen(_) => MsgType::SetFullscreen,
      Self::SetWindowBrightness(_) => MsgType::SetWindowBrightness,
      Self::FullscreenStatus(_) => MsgType::FullscreenStatus,
      Self::RealScreenCoordinates { .. } => MsgType::RealScreenCoordinates,
      Self::LoadAsset(_) => MsgType::LoadAsset,
      Self::UnloadAsset(_) => MsgType::UnloadAsset,
      Self::Assets(_) => MsgType::Assets,
      Self::DrawTexture(_) => MsgType::DrawTexture,
      Self::SetVsync(_) => MsgType::SetVsync,
      Self::SetInternalResolution { .. } => MsgType::SetInternalResolution,
      Self::ShowFps(_) => MsgType::ShowFps,
      Self::SetDarkness(_) => MsgType::SetDarkness,
      Self::EnableLighting(_) => MsgType::EnableLighting,
      Self::RunScript(_) => MsgType::RunScript,
      Self::LogInfo(_) => MsgType::LogInfo,
      Self::LogSuccess(_) => MsgType::LogSuccess,
      Self::LogWarning(_) => MsgType::LogWarning,
      Self::LogError(_) => MsgType::LogError,
      Self::ConsoleClear => MsgType::ConsoleClear,
      Self::EndGame => MsgType::EndGame,
    }
  }
}

// -----------------------------------------------------------------------------
// Message Type
// -----------------------------------------------------------------------------

/// Routing key of a message.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum MsgType {
  PlaySound,
  PlayMusic,
  StopMusic,
  PauseMusic,
  StopAllSounds,
  SetAudioEnabled,
  SetMusicVolume,
  SetSoundsVolume,
  SetGravity,
  SetFriction,
  SetFloor,
  PausePhysics,
  UnpausePhysics,
  SpawnBody,
  SetFullscreen,
  SetWindowBrightness,
  FullscreenStatus,
  RealScreenCoordinates,
  LoadAsset,
  UnloadAsset,
  Assets,
  DrawTexture,
  SetVsync,
  SetInternalResolution,
  ShowFps,
  SetDarkness,
  EnableLighting,
  RunScript,
  LogInfo,
  LogSuccess,
  LogWarning,
  LogError,
  ConsoleClear,
  EndGame,
}

impl Display for MsgType {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "{self:?}")
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
