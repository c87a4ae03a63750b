use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::iter::FusedIterator;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::trace;

use crate::bus::Message;

// -----------------------------------------------------------------------------
// Subscriber Ref
// -----------------------------------------------------------------------------

/// A cloneable sending half of a [`Subscriber`] queue.
#[derive(Clone)]
#[repr(transparent)]
pub struct SubscriberRef {
  inner: UnboundedSender<Message>,
}

impl SubscriberRef {
  /// Enqueues `message`; never blocks.
  ///
  /// If the owning [`Subscriber`] has been dropped the message is destroyed
  /// and its slot returned to the pool.
  #[inline]
  pub fn push(&self, message: Message) {
    if let Err(SendError(message)) = self.inner.send(message) {
      trace!(
        target: "st_engine",
        kind = %message.msg_type(),
        slot = %message.slot(),
        "subscriber closed, dropping message",
      );
    }
  }

  /// Returns `true` if the owning [`Subscriber`] has been dropped.
  #[inline]
  pub fn is_closed(&self) -> bool {
    self.inner.is_closed()
  }

  /// Returns `true` if both references feed the same queue.
  #[inline]
  pub fn same_queue(&self, other: &Self) -> bool {
    self.inner.same_channel(&other.inner)
  }
}

impl Debug for SubscriberRef {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("SubscriberRef(..)")
  }
}

// -----------------------------------------------------------------------------
// Subscriber
// -----------------------------------------------------------------------------

/// An unbounded multi-producer, single-consumer message queue.
///
/// Messages pushed by one thread are received in the order they were
/// pushed.
pub struct Subscriber {
  send: SubscriberRef,
  recv: UnboundedReceiver<Message>,
}

impl Subscriber {
  #[inline]
  pub fn new() -> Self {
    let (send, recv): (UnboundedSender<Message>, UnboundedReceiver<Message>) =
      mpsc::unbounded_channel();

    Self {
      send: SubscriberRef { inner: send },
      recv,
    }
  }

  /// Returns a reference that can push into this queue from any thread.
  #[inline]
  pub fn handle(&self) -> SubscriberRef {
    self.send.clone()
  }

  /// Enqueues `message`; never blocks.
  #[inline]
  pub fn push(&self, message: Message) {
    self.send.push(message);
  }

  /// Removes the oldest message, or returns `None` if the queue is empty.
  #[inline]
  pub fn pop_next(&mut self) -> Option<Message> {
    match self.recv.try_recv() {
      Ok(message) => Some(message),
      Err(TryRecvError::Empty) => None,
      // We hold a sender, so the channel never disconnects.
      Err(TryRecvError::Disconnected) => None,
    }
  }

  /// Returns an iterator removing messages until the queue is empty.
  #[inline]
  pub fn drain(&mut self) -> Drain<'_> {
    Drain { queue: self }
  }

  /// Returns the number of queued messages.
  #[inline]
  pub fn len(&self) -> usize {
    self.recv.len()
  }

  /// Returns `true` if no message is queued.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.recv.is_empty()
  }
}

impl Default for Subscriber {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl Debug for Subscriber {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("Subscriber(..)")
  }
}

// -----------------------------------------------------------------------------
// Drain
// -----------------------------------------------------------------------------

/// Iterator returned by [`Subscriber::drain`].
pub struct Drain<'a> {
  queue: &'a mut Subscriber,
}

impl Iterator for Drain<'_> {
  type Item = Message;

  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    self.queue.pop_next()
  }
}

impl FusedIterator for Drain<'_> {}

impl Debug for Drain<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("Drain(..)")
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
