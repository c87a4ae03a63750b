//! Typed publish/subscribe messaging.
//!
//! - [`Payload`] / [`MsgType`]: message data and its routing key
//! - [`MsgPool`]: recycles the slots message envelopes occupy
//! - [`Message`]: immutable envelope; dropping it returns its slot
//! - [`Subscriber`]: per-subsystem inbound queue
//! - [`MessageBus`]: routes messages to subscribers, built via [`BusBuilder`]

mod message;
mod message_bus;
mod payload;
mod pool;
mod subscriber;

pub use self::message::Message;
pub use self::message_bus::BusBuilder;
pub use self::message_bus::MessageBus;
pub use self::payload::BodyDesc;
pub use self::payload::DrawCmd;
pub use self::payload::MsgType;
pub use self::payload::Payload;
pub use self::payload::SoundCmd;
pub use self::pool::MsgPool;
pub use self::pool::PoolExhausted;
pub use self::subscriber::Drain;
pub use self::subscriber::Subscriber;
pub use self::subscriber::SubscriberRef;
