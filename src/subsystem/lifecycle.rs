use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

use crate::task::SubmitError;

// -----------------------------------------------------------------------------
// Lifecycle
// -----------------------------------------------------------------------------

/// Lifecycle state of a subsystem manager.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Lifecycle {
  /// Subscribed to the bus but not yet wired to a context.
  Uninitialized,
  /// Initialized; no frame has been scheduled yet.
  Initialized,
  /// At least one frame has been scheduled.
  Running,
  /// Closed; the subscriber has been dropped.
  Closed,
}

impl Display for Lifecycle {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::Uninitialized => f.write_str("uninitialized"),
      Self::Initialized => f.write_str("initialized"),
      Self::Running => f.write_str("running"),
      Self::Closed => f.write_str("closed"),
    }
  }
}

// -----------------------------------------------------------------------------
// Lifecycle Error
// -----------------------------------------------------------------------------

/// Error returned when a manager operation is not valid in its current
/// lifecycle state.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct LifecycleError {
  pub subsystem: &'static str,
  pub state: Lifecycle,
}

impl Display for LifecycleError {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "{} subsystem is {}", self.subsystem, self.state)
  }
}

impl Error for LifecycleError {}

// -----------------------------------------------------------------------------
// Update Error
// -----------------------------------------------------------------------------

/// Error returned when a frame cannot be scheduled.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum UpdateError {
  Lifecycle(LifecycleError),
  Submit(SubmitError),
}

impl Display for UpdateError {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::Lifecycle(error) => Display::fmt(error, f),
      Self::Submit(error) => Display::fmt(error, f),
    }
  }
}

impl Error for UpdateError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      Self::Lifecycle(error) => Some(error),
      Self::Submit(error) => Some(error),
    }
  }
}

impl From<LifecycleError> for UpdateError {
  #[inline]
  fn from(other: LifecycleError) -> Self {
    Self::Lifecycle(other)
  }
}

impl From<SubmitError> for UpdateError {
  #[inline]
  fn from(other: SubmitError) -> Self {
    Self::Submit(other)
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display() {
    let error: LifecycleError = LifecycleError {
      subsystem: "audio",
      state: Lifecycle::Closed,
    };

    assert_eq!(error.to_string(), "audio subsystem is closed");
    assert_eq!(UpdateError::from(error).to_string(), "audio subsystem is closed");
    assert_eq!(
      UpdateError::from(SubmitError::Closed).to_string(),
      "task manager is closed",
    );
  }
}
