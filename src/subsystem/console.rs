use std::collections::VecDeque;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::bus::Message;
use crate::bus::MessageBus;
use crate::bus::MsgType;
use crate::bus::Payload;
use crate::subsystem::Subsystem;

/// Severity of a console line.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
  Info,
  Success,
  Warning,
  Error,
}

impl Display for LogLevel {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::Info => f.write_str("info"),
      Self::Success => f.write_str("success"),
      Self::Warning => f.write_str("warning"),
      Self::Error => f.write_str("error"),
    }
  }
}

/// A line of console history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
  pub level: LogLevel,
  pub text: String,
}

impl Display for LogLine {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "[{}] {}", self.level, self.text)
  }
}

/// Bounded log history fed by bus log messages.
///
/// Every line is also emitted as a `tracing` event under the
/// `st_engine::console` target. Once full, the oldest line is evicted.
#[derive(Debug)]
pub struct Console {
  history: VecDeque<LogLine>,
  capacity: usize,
}

impl Console {
  /// Creates a console keeping at most `capacity` lines.
  pub fn new(capacity: usize) -> Self {
    let capacity: usize = capacity.max(1);

    Self {
      history: VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  #[inline]
  pub const fn capacity(&self) -> usize {
    self.capacity
  }

  /// Returns the retained lines, oldest first.
  #[inline]
  pub fn history(&self) -> impl ExactSizeIterator<Item = &LogLine> + '_ {
    self.history.iter()
  }

  #[inline]
  pub fn last(&self) -> Option<&LogLine> {
    self.history.back()
  }

  fn push(&mut self, level: LogLevel, text: &str) {
    match level {
      LogLevel::Info | LogLevel::Success => {
        info!(target: "st_engine::console", level = %level, "{text}");
      }
      LogLevel::Warning => warn!(target: "st_engine::console", "{text}"),
      LogLevel::Error => error!(target: "st_engine::console", "{text}"),
    }

    if self.history.len() == self.capacity {
      self.history.pop_front();
    }

    self.history.push_back(LogLine {
      level,
      text: text.to_owned(),
    });
  }
}

impl Subsystem for Console {
  const NAME: &'static str = "console";

  const SUBSCRIPTIONS: &'static [MsgType] = &[
    MsgType::LogInfo,
    MsgType::LogSuccess,
    MsgType::LogWarning,
    MsgType::LogError,
    MsgType::ConsoleClear,
  ];

  fn on_message(&mut self, message: &Message, _bus: &MessageBus) {
    match message.data() {
      Payload::LogInfo(text) => self.push(LogLevel::Info, text),
      Payload::LogSuccess(text) => self.push(LogLevel::Success, text),
      Payload::LogWarning(text) => self.push(LogLevel::Warning, text),
      Payload::LogError(text) => self.push(LogLevel::Error, text),
      Payload::ConsoleClear => self.history.clear(),
      _ => {}
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
