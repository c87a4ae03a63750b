use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Exception category indicating the nature of the error.
///
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExceptionGroup {
  /// Invalid function argument or parameter.
  ///
  /// Indicates the caller provided data that violates function preconditions.
  BadArg,
  /// System capacity limit exceeded.
  ///
  /// Indicates resource exhaustion such as a full id table or a failed
  /// thread spawn.
  SysCap,
  /// Invalid system operation or state.
  ///
  /// Indicates an operation that cannot be performed in the current
  /// lifecycle state, such as initializing a subsystem twice.
  SysInv,
}

impl ExceptionGroup {
  /// Returns the short lowercase name used in log fields.
  #[inline]
  pub const fn label(&self) -> &'static str {
    match self {
      Self::BadArg => "badarg",
      Self::SysCap => "syscap",
      Self::SysInv => "sysinv",
    }
  }
}

impl Display for ExceptionGroup {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Self::BadArg => f.write_str("(BadArg) errors were found with the given argument(s)"),
      Self::SysCap => f.write_str("(SysCap) a system limit has been reached"),
      Self::SysInv => f.write_str("(SysInv) a system invariant has been broken"),
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
