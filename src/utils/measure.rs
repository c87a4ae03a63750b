//! Execution timing.

use std::time::Duration;
use std::time::Instant;

/// Runs `f` and returns its output together with the time it took.
#[inline(always)]
pub(crate) fn measure_fn<F, T>(f: F) -> (T, Duration)
where
  F: FnOnce() -> T,
{
  let start: Instant = Instant::now();
  let output: T = f();

  (output, start.elapsed())
}

#[cfg(test)]
mod tests {
  use std::thread;

  use super::*;

  #[test]
  fn test_measure_fn() {
    let (value, elapsed): (u8, Duration) = measure_fn(|| {
      thread::sleep(Duration::from_millis(5));
      7
    });

    assert_eq!(value, 7);
    assert!(elapsed >= Duration::from_millis(5));
  }
}
