//! Worker-thread task execution.
//!
//! - [`Task`]: a closure plus optional dependency and affinity hint
//! - [`TaskManager`]: fixed pool of workers draining a lock-free queue
//! - [`TaskHandle`]: completion handle returned by [`TaskManager::submit`]

mod completion;
mod error;
mod handle;
mod manager;
mod queue;
mod unit;
mod worker;

pub(crate) use self::completion::Completion;
pub(crate) use self::queue::WorkQueue;
pub(crate) use self::worker::Shared;

pub use self::error::SubmitError;
pub use self::handle::TaskHandle;
pub use self::handle::TaskId;
pub use self::manager::TaskManager;
pub use self::unit::Task;
