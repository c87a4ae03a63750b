//! Utility types and functions used throughout the engine.

mod measure;
mod thread;

pub(crate) use self::measure::measure_fn;
pub(crate) use self::thread::WorkerId;
