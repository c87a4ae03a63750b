//! Line-oriented command scripts.
//!
//! Each non-empty line is `command arg arg ...`; everything after a `#` at
//! the start of a line is ignored. A script is parsed in full before any of
//! its commands is posted, so a bad line rejects the whole script.
//!
//! ```text
//! # level one
//! loadAsset level1.list
//! setGravity 2
//! playSound click.wav 100 0
//! log info level loaded
//! ```

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::str::FromStr;
use std::str::SplitWhitespace;

use crate::bus::BodyDesc;
use crate::bus::DrawCmd;
use crate::bus::Payload;
use crate::bus::SoundCmd;
use crate::consts::AUDIO_MAX_VOLUME;
use crate::subsystem::AssetKey;

// -----------------------------------------------------------------------------
// Script Error
// -----------------------------------------------------------------------------

/// Reason a script line was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScriptErrorKind {
  UnknownCommand(String),
  MissingArgument(&'static str),
  InvalidArgument { name: &'static str, value: String },
  UnexpectedArgument(String),
}

impl Display for ScriptErrorKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::UnknownCommand(command) => write!(f, "unknown command `{command}`"),
      Self::MissingArgument(name) => write!(f, "missing argument `{name}`"),
      Self::InvalidArgument { name, value } => {
        write!(f, "invalid value `{value}` for argument `{name}`")
      }
      Self::UnexpectedArgument(value) => write!(f, "unexpected argument `{value}`"),
    }
  }
}

/// Error returned when a script fails to parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptError {
  /// One-based line number.
  pub line: usize,
  pub kind: ScriptErrorKind,
}

impl Display for ScriptError {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "line {}: {}", self.line, self.kind)
  }
}

impl Error for ScriptError {}

// -----------------------------------------------------------------------------
// Script
// -----------------------------------------------------------------------------

/// A parsed script: the bus messages it posts, in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Script {
  commands: Vec<Payload>,
}

impl Script {
  /// Parses `source`.
  ///
  /// # Errors
  ///
  /// Returns [`ScriptError`] for the first line with an unknown command or
  /// a bad argument.
  pub fn parse(source: &str) -> Result<Self, ScriptError> {
    let mut commands: Vec<Payload> = Vec::new();

    for (index, line) in source.lines().enumerate() {
      if let Some(payload) = parse_line(index + 1, line)? {
        commands.push(payload);
      }
    }

    Ok(Self { commands })
  }

  #[inline]
  pub fn commands(&self) -> &[Payload] {
    &self.commands
  }

  #[inline]
  pub fn into_commands(self) -> Vec<Payload> {
    self.commands
  }
}

impl FromStr for Script {
  type Err = ScriptError;

  #[inline]
  fn from_str(source: &str) -> Result<Self, Self::Err> {
    Self::parse(source)
  }
}

// -----------------------------------------------------------------------------
// Parser
// -----------------------------------------------------------------------------

struct Args<'a> {
  line: usize,
  words: SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
  fn error(&self, kind: ScriptErrorKind) -> ScriptError {
    ScriptError {
      line: self.line,
      kind,
    }
  }

  fn word(&mut self, name: &'static str) -> Result<&'a str, ScriptError> {
    self
      .words
      .next()
      .ok_or_else(|| self.error(ScriptErrorKind::MissingArgument(name)))
  }

  fn next<T>(&mut self, name: &'static str) -> Result<T, ScriptError>
  where
    T: FromStr,
  {
    let word: &str = self.word(name)?;
    self.convert(name, word)
  }

  fn optional<T>(&mut self, name: &'static str, default: T) -> Result<T, ScriptError>
  where
    T: FromStr,
  {
    match self.words.next() {
      Some(word) => self.convert(name, word),
      None => Ok(default),
    }
  }

  fn rest(&mut self, name: &'static str) -> Result<String, ScriptError> {
    let words: Vec<&str> = self.words.by_ref().collect();

    if words.is_empty() {
      return Err(self.error(ScriptErrorKind::MissingArgument(name)));
    }

    Ok(words.join(" "))
  }

  fn asset(&mut self, name: &'static str) -> Result<AssetKey, ScriptError> {
    self.word(name).map(AssetKey::of_path)
  }

  fn sound(&mut self) -> Result<SoundCmd, ScriptError> {
    Ok(SoundCmd {
      id: self.asset("name")?,
      volume: self.optional("volume", AUDIO_MAX_VOLUME)?,
      loops: self.optional("loops", 0)?,
    })
  }

  fn convert<T>(&self, name: &'static str, word: &str) -> Result<T, ScriptError>
  where
    T: FromStr,
  {
    word.parse().map_err(|_| {
      self.error(ScriptErrorKind::InvalidArgument {
        name,
        value: word.to_owned(),
      })
    })
  }

  fn finish(mut self) -> Result<(), ScriptError> {
    match self.words.next() {
      Some(word) => Err(self.error(ScriptErrorKind::UnexpectedArgument(word.to_owned()))),
      None => Ok(()),
    }
  }
}

fn parse_line(line: usize, source: &str) -> Result<Option<Payload>, ScriptError> {
  let source: &str = source.trim();

  if source.is_empty() || source.starts_with('#') {
    return Ok(None);
  }

  let mut words: SplitWhitespace<'_> = source.split_whitespace();

  let Some(command) = words.next() else {
    return Ok(None);
  };

  let mut args: Args<'_> = Args { line, words };

  let payload: Payload = match command {
    "log" => {
      let level: &str = args.word("level")?;
      let text: String = args.rest("text")?;

      match level {
        "info" => Payload::LogInfo(text),
        "success" => Payload::LogSuccess(text),
        "warning" | "warn" => Payload::LogWarning(text),
        "error" => Payload::LogError(text),
        _ => {
          return Err(args.error(ScriptErrorKind::InvalidArgument {
            name: "level",
            value: level.to_owned(),
          }));
        }
      }
    }
    "consoleClear" => Payload::ConsoleClear,
    "endGame" => Payload::EndGame,
    // physics
    "setGravity" => Payload::SetGravity(args.next("gravity")?),
    "setFriction" => Payload::SetFriction(args.next("friction")?),
    "setFloor" => Payload::SetFloor(args.next("floor")?),
    "pausePhysics" => Payload::PausePhysics,
    "unpausePhysics" => Payload::UnpausePhysics,
    "spawnBody" => Payload::SpawnBody(BodyDesc {
      x: args.next("x")?,
      y: args.next("y")?,
      velocity_x: args.optional("velocity_x", 0)?,
      velocity_y: args.optional("velocity_y", 0)?,
    }),
    // audio
    "playSound" => Payload::PlaySound(args.sound()?),
    "playMusic" => Payload::PlayMusic(args.sound()?),
    "stopMusic" => Payload::StopMusic,
    "pauseMusic" => Payload::PauseMusic,
    "stopAllSounds" => Payload::StopAllSounds,
    "setAudioEnabled" => Payload::SetAudioEnabled(args.next("enabled")?),
    "setMusicVolume" => Payload::SetMusicVolume(args.next("volume")?),
    "setSoundsVolume" => Payload::SetSoundsVolume(args.next("volume")?),
    // display
    "setFullscreen" => Payload::SetFullscreen(args.next("fullscreen")?),
    "setBrightness" => Payload::SetWindowBrightness(args.next("brightness")?),
    // assets
    "loadAsset" => Payload::LoadAsset(args.next("path")?),
    "unloadAsset" => Payload::UnloadAsset(args.next("path")?),
    // renderer
    "drawTexture" => Payload::DrawTexture(DrawCmd {
      texture: args.asset("texture")?,
      x: args.next("x")?,
      y: args.next("y")?,
      layer: args.optional("layer", 0)?,
    }),
    "setVsync" => Payload::SetVsync(args.next("vsync")?),
    "setInternalResolution" => Payload::SetInternalResolution {
      width: args.next("width")?,
      height: args.next("height")?,
    },
    "showFps" => Payload::ShowFps(args.next("show")?),
    "setDarkness" => Payload::SetDarkness(args.next("darkness")?),
    "enableLighting" => Payload::EnableLighting(args.next("lighting")?),
    _ => {
      return Err(args.error(ScriptErrorKind::UnknownCommand(command.to_owned())));
    }
  };

  args.finish()?;

  Ok(Some(payload))
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
