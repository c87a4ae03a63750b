use std::time::Duration;

use crate::core::SlotTable;

// -----------------------------------------------------------------------------
// System - Scheduler Behavior
// -----------------------------------------------------------------------------

/// Default number of worker threads in the task manager.
///
/// Note: This value is only used when a default value is not
///       retrievable from the host environment.
pub const DEFAULT_PARALLELISM: usize = 1;

/// Stack size (in bytes) for worker threads.
pub const DEFAULT_THREAD_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Number of task identifiers that may be in flight at the same time.
pub const DEFAULT_TASK_ID_CAPACITY: usize = 1 << 12;

// -----------------------------------------------------------------------------
// System - Memory Allocation
// -----------------------------------------------------------------------------

/// Number of message slots allocated up front.
pub const DEFAULT_MSG_POOL_CAPACITY: usize = SlotTable::DEF_ENTRIES;

/// Upper bound on the number of message slots the pool may grow to.
pub const DEFAULT_MSG_POOL_HARD_CAP: usize = 1 << 20;

/// Number of log lines retained by the console subsystem.
pub const DEFAULT_CONSOLE_HISTORY: usize = 256;

// -----------------------------------------------------------------------------
// Subsystems - Display
// -----------------------------------------------------------------------------

/// Width of the window when the host display cannot be queried.
pub const DEFAULT_DISPLAY_WIDTH: u32 = 1920;

/// Height of the window when the host display cannot be queried.
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 1080;

// -----------------------------------------------------------------------------
// Subsystems - Audio
// -----------------------------------------------------------------------------

/// Maximum playback volume.
pub const AUDIO_MAX_VOLUME: u8 = 128;

/// Number of sound channels that may play simultaneously.
pub const AUDIO_CHANNELS: usize = 16;

// -----------------------------------------------------------------------------
// Subsystems - Physics
// -----------------------------------------------------------------------------

/// Gravity applied to bodies before a level sets its own.
pub const PHYSICS_INIT_GRAVITY: i8 = 0;

/// Horizontal velocity lost per step before a level sets its own.
pub const PHYSICS_INIT_FRICTION: i8 = 4;

/// Lowest point a body may fall to before a level sets its own.
pub const PHYSICS_INIT_FLOOR: i32 = 0;

// -----------------------------------------------------------------------------
// Subsystems - Assets
// -----------------------------------------------------------------------------

/// Directory asset paths are resolved against.
pub const DEFAULT_ASSET_ROOT: &str = "assets";

/// File extension marking a list of asset paths.
pub const ASSET_LIST_EXTENSION: &str = "list";

// -----------------------------------------------------------------------------
// System - Shutdown
// -----------------------------------------------------------------------------

/// Shutdown durations above this threshold are reported as warnings.
pub const SHUTDOWN_WARN_THRESHOLD: Duration = Duration::from_secs(5);
