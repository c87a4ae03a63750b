//! Exception handling and error types for the engine.
//!
//! Exceptions carry three pieces of information:
//!
//! 1. **Class**: The severity level ([`Error`])
//! 2. **Group**: The error category ([`BadArg`], [`SysCap`], [`SysInv`])
//! 3. **Description**: A human-readable error message
//!
//! # Error Tiers
//!
//! The engine distinguishes three kinds of failure:
//!
//! - **Recoverable**: operations that may fail in normal use return a typed
//!   error (`SubmitError`, `UpdateError`, `PoolExhausted`, ...).
//! - **Misuse**: calling an operation in a state where it is never valid
//!   (initializing a subsystem twice, subscribing a queue twice) panics
//!   with an [`Exception`] through the [`raise!`] macro.
//! - **Fatal**: broken invariants and pool exhaustion print a diagnostic
//!   and abort the process.
//!
//! # Raising Exceptions
//!
//! ```
//! use st_engine::raise;
//!
//! fn set_volume(volume: u16) {
//!   if volume > 128 {
//!     raise!(Error, BadArg, "volume out of range");
//!   }
//! }
//! ```
//!
//! [`Error`]: ExceptionClass::Error
//! [`BadArg`]: ExceptionGroup::BadArg
//! [`SysCap`]: ExceptionGroup::SysCap
//! [`SysInv`]: ExceptionGroup::SysInv
//!
//! [`raise!`]: crate::raise!

mod exception;
mod exception_class;
mod exception_group;

pub use self::exception::Exception;
pub use self::exception_class::ExceptionClass;
pub use self::exception_group::ExceptionGroup;

// -----------------------------------------------------------------------------
// raise!
// -----------------------------------------------------------------------------

/// Raises an exception with the specified class, group, and message.
///
/// This macro constructs an [`Exception`] and immediately panics.
///
/// # Examples
///
/// ```should_panic
/// # use st_engine::raise;
/// raise!(Error, SysInv, "subsystem already initialized");
/// ```
#[macro_export]
macro_rules! raise {
  ($class:ident, $group:ident, $error:expr $(,)?) => {
    ::std::panic!(
      "{}",
      $crate::error::Exception::new(
        $crate::error::ExceptionClass::$class,
        $crate::error::ExceptionGroup::$group,
        $error,
      ),
    )
  };
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::panic;

  #[test]
  fn test_raise_macro_badarg() {
    assert!(panic::catch_unwind(|| raise!(Error, BadArg, "duplicate subscription")).is_err());
  }

  #[test]
  fn test_raise_macro_sysinv() {
    assert!(panic::catch_unwind(|| raise!(Error, SysInv, "already initialized")).is_err());
  }

  #[test]
  fn test_raise_message() {
    let error = panic::catch_unwind(|| raise!(Error, SysInv, "already initialized")).unwrap_err();
    let message: &String = error.downcast_ref::<String>().unwrap();

    assert!(message.starts_with("error:(SysInv)"));
    assert!(message.ends_with("already initialized"));
  }
}
