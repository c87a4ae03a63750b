//! Internal error handling macros.

/// Displays a system error message and aborts the program.
///
/// Reserved for conditions the engine cannot continue from: exhausting the
/// message pool, a slot released twice, or a broken queue invariant. The
/// program prints a diagnostic message and aborts without unwinding.
///
/// # Examples
///
/// ```ignore
/// let Some(task) = self.tasks.pop() else {
///   fatal!("work queue permit without a queued task");
/// };
/// ```
macro_rules! fatal {
  ($error:expr) => {{
    ::std::eprintln!(
      "{}:{}: (SysInv) a system invariant has been broken: {}",
      ::std::file!(),
      ::std::line!(),
      $error,
    );

    ::std::process::abort();
  }};
}

pub(crate) use fatal;
