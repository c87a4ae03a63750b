use std::path::PathBuf;
use std::thread;

use crate::consts;

/// Returns the number of available CPU cores.
///
/// Falls back to [`DEFAULT_PARALLELISM`] if CPU detection fails.
///
/// [`DEFAULT_PARALLELISM`]: consts::DEFAULT_PARALLELISM
pub fn available_cpus() -> usize {
  match thread::available_parallelism() {
    Ok(count) => count.get(),
    Err(_) => consts::DEFAULT_PARALLELISM,
  }
}

// -----------------------------------------------------------------------------
// Engine Config
// -----------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct EngineConfig {
  // ---------------------------------------------------------------------------
  // Scheduler Configuration
  // ---------------------------------------------------------------------------
  pub worker_threads: usize,
  pub worker_stack_size: usize,
  pub task_id_capacity: usize,
  // ---------------------------------------------------------------------------
  // Message Pool Configuration
  // ---------------------------------------------------------------------------
  pub msg_pool_capacity: usize,
  pub msg_pool_hard_cap: usize,
  // ---------------------------------------------------------------------------
  // Subsystem Configuration
  // ---------------------------------------------------------------------------
  pub display_width: u32,
  pub display_height: u32,
  pub console_history: usize,
  pub asset_root: PathBuf,
  // ---------------------------------------------------------------------------
  // Tracing Subscriber Configuration
  // ---------------------------------------------------------------------------
  pub tracing_source_file: bool,
  pub tracing_source_line: bool,
  pub tracing_source_name: bool,
  pub tracing_thread_info: bool,
  pub tracing_verbose: bool,
  pub tracing_very_verbose: bool,
}

impl EngineConfig {
  #[inline]
  pub fn new() -> Self {
    Self {
      worker_threads: available_cpus(),
      worker_stack_size: consts::DEFAULT_THREAD_STACK_SIZE,
      task_id_capacity: consts::DEFAULT_TASK_ID_CAPACITY,
      msg_pool_capacity: consts::DEFAULT_MSG_POOL_CAPACITY,
      msg_pool_hard_cap: consts::DEFAULT_MSG_POOL_HARD_CAP,
      display_width: consts::DEFAULT_DISPLAY_WIDTH,
      display_height: consts::DEFAULT_DISPLAY_HEIGHT,
      console_history: consts::DEFAULT_CONSOLE_HISTORY,
      asset_root: PathBuf::from(consts::DEFAULT_ASSET_ROOT),
      tracing_source_file: false,
      tracing_source_line: false,
      tracing_source_name: false,
      tracing_thread_info: true,
      tracing_verbose: true,
      tracing_very_verbose: false,
    }
  }

  #[inline]
  pub const fn tracing_filter(&self) -> tracing::Level {
    if self.tracing_very_verbose {
      tracing::Level::TRACE
    } else if self.tracing_verbose {
      tracing::Level::DEBUG
    } else {
      tracing::Level::INFO
    }
  }
}

impl Default for EngineConfig {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config: EngineConfig = EngineConfig::default();

    assert!(config.worker_threads >= 1);
    assert_eq!(config.msg_pool_capacity, consts::DEFAULT_MSG_POOL_CAPACITY);
    assert_eq!(config.asset_root, PathBuf::from("assets"));
  }

  #[test]
  fn test_tracing_filter() {
    let mut config: EngineConfig = EngineConfig::new();

    assert_eq!(config.tracing_filter(), tracing::Level::DEBUG);

    config.tracing_very_verbose = true;
    assert_eq!(config.tracing_filter(), tracing::Level::TRACE);

    config.tracing_very_verbose = false;
    config.tracing_verbose = false;
    assert_eq!(config.tracing_filter(), tracing::Level::INFO);
  }
}
