use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Error returned when a task cannot be submitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmitError {
  /// The task manager has been closed.
  Closed,
  /// Every task identifier is in use.
  Capacity,
}

impl Display for SubmitError {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::Closed => f.write_str("task manager is closed"),
      Self::Capacity => f.write_str("too many tasks in flight"),
    }
  }
}

impl Error for SubmitError {}
