use tracing::debug;

use crate::bus::Message;
use crate::bus::MessageBus;
use crate::bus::MsgType;
use crate::bus::Payload;
use crate::subsystem::Script;
use crate::subsystem::ScriptError;
use crate::subsystem::Subsystem;

/// Runs command scripts by posting their messages to the bus.
#[derive(Debug, Default)]
pub struct Scripting {
  runs: u64,
  failures: u64,
}

impl Scripting {
  #[inline]
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of scripts run successfully.
  #[inline]
  pub const fn runs(&self) -> u64 {
    self.runs
  }

  /// Number of scripts rejected.
  #[inline]
  pub const fn failures(&self) -> u64 {
    self.failures
  }

  fn run(&mut self, source: &str, bus: &MessageBus) {
    match Script::parse(source) {
      Ok(script) => {
        debug!(target: "st_engine", commands = script.commands().len(), "run script");

        for payload in script.into_commands() {
          bus.post(payload);
        }

        self.runs += 1;
      }
      Err(error) => {
        self.failures += 1;
        report(&error, bus);
      }
    }
  }
}

impl Subsystem for Scripting {
  const NAME: &'static str = "scripting";

  const SUBSCRIPTIONS: &'static [MsgType] = &[MsgType::RunScript];

  fn on_message(&mut self, message: &Message, bus: &MessageBus) {
    if let Payload::RunScript(source) = message.data() {
      self.run(source, bus);
    }
  }
}

fn report(error: &ScriptError, bus: &MessageBus) {
  bus.post(Payload::LogError(format!("Cannot run script: {error}")));
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
