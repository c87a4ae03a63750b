use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

use crate::error::ExceptionClass;
use crate::error::ExceptionGroup;

/// A structured exception with class, group, message, and backtrace.
///
/// Exceptions are raised via the [`raise!`] macro when a caller misuses the
/// engine, and returned as plain values when setup fails (for example when
/// a worker thread cannot be spawned).
///
/// # Display Format
///
/// Exceptions format as: `{class}:{group} - {message}`
///
/// Example: `error:(SysCap) a system limit has been reached - failed to spawn worker`
///
/// [`raise!`]: crate::raise
pub struct Exception {
  class: ExceptionClass,
  group: ExceptionGroup,
  error: String,
  trace: Backtrace,
}

impl Exception {
  /// Creates a new exception with the given class, group, and message.
  ///
  /// Captures a backtrace at the call site.
  ///
  /// # Examples
  ///
  /// ```
  /// use st_engine::error::Exception;
  /// use st_engine::error::ExceptionClass;
  /// use st_engine::error::ExceptionGroup;
  ///
  /// let exception: Exception = Exception::new(
  ///   ExceptionClass::Error,
  ///   ExceptionGroup::SysCap,
  ///   "failed to spawn worker",
  /// );
  ///
  /// assert_eq!(exception.group(), ExceptionGroup::SysCap);
  /// ```
  #[inline]
  pub fn new<T>(class: ExceptionClass, group: ExceptionGroup, error: T) -> Self
  where
    T: Display,
  {
    Self {
      class,
      group,
      error: error.to_string(),
      trace: Backtrace::capture(),
    }
  }

  /// Returns the exception's severity class.
  #[inline]
  pub const fn class(&self) -> ExceptionClass {
    self.class
  }

  /// Returns the exception's error category.
  #[inline]
  pub const fn group(&self) -> ExceptionGroup {
    self.group
  }

  /// Returns the human-readable error message.
  #[inline]
  pub const fn error(&self) -> &str {
    self.error.as_str()
  }

  /// Returns the captured backtrace.
  #[inline]
  pub const fn trace(&self) -> &Backtrace {
    &self.trace
  }
}

impl Debug for Exception {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Display::fmt(self, f)
  }
}

impl Display for Exception {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "{}:{} - {}", self.class, self.group, self.error)
  }
}

impl Error for Exception {}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display() {
    let exception: Exception = Exception::new(ExceptionClass::Error, ExceptionGroup::BadArg, "oops");

    assert_eq!(
      exception.to_string(),
      "error:(BadArg) errors were found with the given argument(s) - oops",
    );
    assert_eq!(exception.error(), "oops");
    assert_eq!(exception.class(), ExceptionClass::Error);
  }
}
