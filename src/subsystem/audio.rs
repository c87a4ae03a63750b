use tracing::trace;
use triomphe::Arc;

use crate::bus::Message;
use crate::bus::MessageBus;
use crate::bus::MsgType;
use crate::bus::Payload;
use crate::bus::SoundCmd;
use crate::consts::AUDIO_CHANNELS;
use crate::consts::AUDIO_MAX_VOLUME;
use crate::subsystem::AssetKind;
use crate::subsystem::AssetSnapshot;
use crate::subsystem::Subsystem;

/// Observable state of the [`Audio`] subsystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioState {
  pub enabled: bool,
  pub music_volume: u8,
  pub sounds_volume: u8,
  /// Current music track.
  pub music: Option<SoundCmd>,
  pub music_paused: bool,
  /// Sounds occupying a mixing channel.
  pub channels: Vec<SoundCmd>,
  /// Last sound accepted for playback.
  pub last_sound: Option<SoundCmd>,
  pub played: u64,
  /// Sounds dropped because the asset was missing or no channel was free.
  pub skipped: u64,
}

impl AudioState {
  /// Returns the volume `sound` is mixed at after global settings apply.
  pub fn effective_volume(&self, sound: &SoundCmd) -> u8 {
    if !self.enabled {
      return 0;
    }

    let scaled: u32 = u32::from(sound.volume) * u32::from(self.sounds_volume);

    (scaled / u32::from(AUDIO_MAX_VOLUME)) as u8
  }
}

impl Default for AudioState {
  fn default() -> Self {
    Self {
      enabled: true,
      music_volume: AUDIO_MAX_VOLUME,
      sounds_volume: AUDIO_MAX_VOLUME,
      music: None,
      music_paused: false,
      channels: Vec::with_capacity(AUDIO_CHANNELS),
      last_sound: None,
      played: 0,
      skipped: 0,
    }
  }
}

/// Sound and music playback bookkeeping.
///
/// Playback is only accepted for assets present in the latest
/// [`AssetSnapshot`]; anything else is reported to the console.
#[derive(Debug, Default)]
pub struct Audio {
  state: AudioState,
  assets: Option<Arc<AssetSnapshot>>,
}

impl Audio {
  #[inline]
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub const fn state(&self) -> &AudioState {
    &self.state
  }

  fn is_loaded(&self, sound: &SoundCmd, kind: AssetKind) -> bool {
    self
      .assets
      .as_ref()
      .is_some_and(|assets| assets.contains_kind(sound.id, kind))
  }

  fn play_sound(&mut self, sound: SoundCmd, bus: &MessageBus) {
    if !self.is_loaded(&sound, AssetKind::Sound) {
      self.state.skipped += 1;
      bus.post(Payload::LogWarning(format!("Sound {} is not loaded", sound.id)));
      return;
    }

    if self.state.channels.len() >= AUDIO_CHANNELS {
      self.state.skipped += 1;
      bus.post(Payload::LogWarning(format!("No free channel for sound {}", sound.id)));
      return;
    }

    let sound: SoundCmd = clamp(sound);

    trace!(target: "st_engine", id = %sound.id, volume = sound.volume, "play sound");

    self.state.channels.push(sound);
    self.state.last_sound = Some(sound);
    self.state.played += 1;
  }

  fn play_music(&mut self, music: SoundCmd, bus: &MessageBus) {
    if !self.is_loaded(&music, AssetKind::Music) {
      bus.post(Payload::LogWarning(format!("Music {} is not loaded", music.id)));
      return;
    }

    self.state.music = Some(clamp(music));
    self.state.music_paused = false;
  }
}

impl Subsystem for Audio {
  const NAME: &'static str = "audio";

  const SUBSCRIPTIONS: &'static [MsgType] = &[
    MsgType::PlaySound,
    MsgType::PlayMusic,
    MsgType::StopMusic,
    MsgType::PauseMusic,
    MsgType::StopAllSounds,
    MsgType::SetAudioEnabled,
    MsgType::SetMusicVolume,
    MsgType::SetSoundsVolume,
    MsgType::Assets,
  ];

  fn on_message(&mut self, message: &Message, bus: &MessageBus) {
    match message.data() {
      Payload::PlaySound(sound) => self.play_sound(*sound, bus),
      Payload::PlayMusic(music) => self.play_music(*music, bus),
      Payload::StopMusic => {
        self.state.music = None;
        self.state.music_paused = false;
      }
      Payload::PauseMusic => {
        self.state.music_paused = self.state.music.is_some();
      }
      Payload::StopAllSounds => {
        self.state.channels.clear();
      }
      Payload::SetAudioEnabled(enabled) => {
        self.state.enabled = *enabled;
      }
      Payload::SetMusicVolume(volume) => {
        self.state.music_volume = (*volume).min(AUDIO_MAX_VOLUME);
      }
      Payload::SetSoundsVolume(volume) => {
        self.state.sounds_volume = (*volume).min(AUDIO_MAX_VOLUME);
      }
      Payload::Assets(snapshot) => {
        self.assets = Some(Arc::clone(snapshot));
      }
      _ => {}
    }
  }

  /// Advances looping sounds and frees channels of finished ones.
  fn on_frame(&mut self, _bus: &MessageBus) {
    self.state.channels.retain_mut(|sound| match sound.loops {
      0 => false,
      1.. => {
        sound.loops -= 1;
        true
      }
      _ => true,
    });
  }

  fn on_close(&mut self) {
    self.state.channels.clear();
    self.state.music = None;
  }
}

fn clamp(sound: SoundCmd) -> SoundCmd {
  SoundCmd {
    volume: sound.volume.min(AUDIO_MAX_VOLUME),
    ..sound
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
