use hashbrown::HashMap;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use tracing::trace;
use triomphe::Arc;

use crate::bus::Message;
use crate::bus::MsgPool;
use crate::bus::MsgType;
use crate::bus::Payload;
use crate::bus::Subscriber;
use crate::bus::SubscriberRef;
use crate::raise;

// -----------------------------------------------------------------------------
// Bus Builder
// -----------------------------------------------------------------------------

/// Collects subscriptions before the bus starts routing messages.
///
/// Subscriptions can only be made here; [`build`] freezes the routing table
/// into an immutable [`MessageBus`].
///
/// [`build`]: Self::build
pub struct BusBuilder {
  routes: HashMap<MsgType, Vec<SubscriberRef>>,
  pool: MsgPool,
}

impl BusBuilder {
  #[inline]
  pub fn new(pool: MsgPool) -> Self {
    Self {
      routes: HashMap::new(),
      pool,
    }
  }

  /// Registers `subscriber` to receive every message of type `kind`.
  ///
  /// Subscribers receive messages in the order they subscribed.
  ///
  /// # Panics
  ///
  /// Panics with a `BadArg` exception if `subscriber` is already subscribed
  /// to `kind`.
  pub fn subscribe(&mut self, kind: MsgType, subscriber: &Subscriber) -> &mut Self {
    let handle: SubscriberRef = subscriber.handle();
    let targets: &mut Vec<SubscriberRef> = self.routes.entry(kind).or_default();

    if targets.iter().any(|target| target.same_queue(&handle)) {
      raise!(Error, BadArg, format!("duplicate subscription to {kind}"));
    }

    targets.push(handle);
    self
  }

  /// Returns the pool messages are allocated from.
  #[inline]
  pub fn pool(&self) -> &MsgPool {
    &self.pool
  }

  /// Freezes the routing table.
  pub fn build(self) -> Arc<MessageBus> {
    let routes: HashMap<MsgType, Box<[SubscriberRef]>> = self
      .routes
      .into_iter()
      .map(|(kind, targets)| (kind, targets.into_boxed_slice()))
      .collect();

    Arc::new(MessageBus {
      routes,
      pool: self.pool,
    })
  }
}

impl Debug for BusBuilder {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("BusBuilder(..)")
  }
}

// -----------------------------------------------------------------------------
// Message Bus
// -----------------------------------------------------------------------------

/// Routes messages to every subscriber registered for their type.
///
/// # Fan-Out
///
/// - No subscriber: the message is destroyed.
/// - One subscriber: the message is handed over as is.
/// - Several subscribers: each receives its own envelope sharing the
///   payload, in subscription order, and the original is destroyed.
pub struct MessageBus {
  routes: HashMap<MsgType, Box<[SubscriberRef]>>,
  pool: MsgPool,
}

impl MessageBus {
  /// Starts collecting subscriptions for a bus allocating from `pool`.
  #[inline]
  pub fn builder(pool: MsgPool) -> BusBuilder {
    BusBuilder::new(pool)
  }

  /// Returns the pool messages are allocated from.
  #[inline]
  pub fn pool(&self) -> &MsgPool {
    &self.pool
  }

  /// Returns the number of subscribers registered for `kind`.
  #[inline]
  pub fn subscribers(&self, kind: MsgType) -> usize {
    self.routes.get(&kind).map_or(0, |targets| targets.len())
  }

  /// Allocates a message carrying `payload` from the bus pool.
  #[inline]
  pub fn make_msg<T>(&self, payload: T) -> Message
  where
    T: Into<Arc<Payload>>,
  {
    self.pool.make_msg(payload)
  }

  /// Delivers `message` to every subscriber of its type.
  pub fn send(&self, message: Message) {
    let targets: &[SubscriberRef] = match self.routes.get(&message.msg_type()) {
      Some(targets) => targets,
      None => &[],
    };

    trace!(
      target: "st_engine",
      kind = %message.msg_type(),
      slot = %message.slot(),
      subscribers = targets.len(),
      "send",
    );

    match targets {
      [] => message.destroy(),
      [target] => target.push(message),
      targets => {
        for target in targets {
          target.push(message.make_copy());
        }

        message.destroy();
      }
    }
  }

  /// Allocates a message carrying `payload` and sends it.
  #[inline]
  pub fn post<T>(&self, payload: T)
  where
    T: Into<Arc<Payload>>,
  {
    self.send(self.make_msg(payload));
  }
}

impl Debug for MessageBus {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("MessageBus")
      .field("routes", &self.routes.len())
      .field("pool", &self.pool)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::panic;
  use std::thread;

  use super::*;
  use crate::core::SlotId;

  #[test]
  fn test_zero_subscribers() {
    let pool: MsgPool = MsgPool::with_capacity(16, 16);
    let bus: Arc<MessageBus> = MessageBus::builder(pool.clone()).build();

    bus.post(Payload::EndGame);

    assert_eq!(bus.subscribers(MsgType::EndGame), 0);
    assert_eq!(pool.live(), 0);
  }

  #[test]
  fn test_single_subscriber_keeps_slot() {
    let pool: MsgPool = MsgPool::with_capacity(16, 16);
    let mut queue: Subscriber = Subscriber::new();
    let mut setup: BusBuilder = MessageBus::builder(pool.clone());

    setup.subscribe(MsgType::SetFloor, &queue);

    let bus: Arc<MessageBus> = setup.build();
    let message: Message = bus.make_msg(Payload::SetFloor(10));
    let slot: SlotId = message.slot();

    bus.send(message);

    let received: Message = queue.pop_next().unwrap();

    assert_eq!(received.slot(), slot);
    assert_eq!(pool.live(), 1);
  }

  #[test]
  fn test_fan_out_order() {
    let pool: MsgPool = MsgPool::with_capacity(16, 16);
    let mut first: Subscriber = Subscriber::new();
    let mut second: Subscriber = Subscriber::new();
    let mut setup: BusBuilder = MessageBus::builder(pool.clone());

    setup
      .subscribe(MsgType::ShowFps, &first)
      .subscribe(MsgType::ShowFps, &second);

    let bus: Arc<MessageBus> = setup.build();

    bus.post(Payload::ShowFps(true));

    let a: Message = first.pop_next().unwrap();
    let b: Message = second.pop_next().unwrap();

    assert_eq!(bus.subscribers(MsgType::ShowFps), 2);
    assert_ne!(a.slot(), b.slot());
    assert!(Arc::ptr_eq(a.shared(), b.shared()));
    assert_eq!(pool.live(), 2);
  }

  #[test]
  fn test_duplicate_subscription() {
    let queue: Subscriber = Subscriber::new();
    let mut setup: BusBuilder = MessageBus::builder(MsgPool::with_capacity(16, 16));

    setup.subscribe(MsgType::EndGame, &queue);

    let result: thread::Result<()> = panic::catch_unwind(panic::AssertUnwindSafe(|| {
      setup.subscribe(MsgType::EndGame, &queue);
    }));

    assert!(result.is_err());
  }
}
