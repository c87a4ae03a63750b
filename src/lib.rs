//! st-engine - the message-passing core of a 2D side-scrolling game engine.
//!
//! Independently scheduled subsystems (renderer, physics, audio, display,
//! assets, scripting, console) communicate exclusively through typed
//! messages routed by a publish/subscribe [`MessageBus`], while all work is
//! executed on a fixed pool of worker threads owned by the [`TaskManager`].
//!
//! # Quick Start
//!
//! ```no_run
//! use st_engine::bus::Payload;
//! use st_engine::engine::Engine;
//! use st_engine::engine::EngineConfig;
//!
//! let mut engine: Engine = Engine::new(EngineConfig::new()).unwrap();
//!
//! engine.bus().post(Payload::RunScript("setGravity 2\nendGame".into()));
//! engine.run(None).unwrap();
//! engine.close();
//! ```
//!
//! # Core Modules
//!
//! - [`bus`]: Messages, the message pool, subscribers and the bus itself
//! - [`task`]: Tasks and the worker-thread task manager
//! - [`subsystem`]: Subsystem managers reacting to bus messages
//! - [`engine`]: The orchestrator owning every component
//! - [`error`]: Exception system
//! - [`consts`]: Runtime configuration constants
//!
//! [`MessageBus`]: crate::bus::MessageBus
//! [`TaskManager`]: crate::task::TaskManager

mod loom;
mod utils;

pub mod bus;
pub mod consts;
pub mod core;
pub mod engine;
pub mod error;
pub mod subsystem;
pub mod task;
