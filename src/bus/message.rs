use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use tracing::error;
use triomphe::Arc;

use crate::bus::MsgPool;
use crate::bus::MsgType;
use crate::bus::Payload;
use crate::bus::PoolExhausted;
use crate::core::SlotId;
use crate::core::fatal;

/// An immutable message envelope.
///
/// A message pairs a [`MsgType`] with a shared [`Payload`] and the pool slot
/// it occupies. Copies made with [`make_copy`] occupy their own slot but
/// share the payload. Dropping a message returns its slot to the pool; the
/// payload is released together with its last envelope.
///
/// [`make_copy`]: Self::make_copy
pub struct Message {
  kind: MsgType,
  slot: SlotId,
  data: Arc<Payload>,
  pool: MsgPool,
}

impl Message {
  #[inline]
  pub(crate) fn new(pool: MsgPool, slot: SlotId, data: Arc<Payload>) -> Self {
    Self {
      kind: data.msg_type(),
      slot,
      data,
      pool,
    }
  }

  /// Returns the routing key of this message.
  #[inline]
  pub const fn msg_type(&self) -> MsgType {
    self.kind
  }

  /// Returns the payload carried by this message.
  #[inline]
  pub fn data(&self) -> &Payload {
    &self.data
  }

  /// Returns the shared payload handle.
  #[inline]
  pub const fn shared(&self) -> &Arc<Payload> {
    &self.data
  }

  /// Returns the pool slot occupied by this message.
  #[inline]
  pub const fn slot(&self) -> SlotId {
    self.slot
  }

  /// Returns the pool this message was allocated from.
  #[inline]
  pub const fn pool(&self) -> &MsgPool {
    &self.pool
  }

  /// Creates a new envelope with its own slot sharing this payload.
  ///
  /// # Errors
  ///
  /// Returns [`PoolExhausted`] if no slot can be allocated.
  #[inline]
  pub fn try_copy(&self) -> Result<Self, PoolExhausted> {
    self.pool.try_make_msg(Arc::clone(&self.data))
  }

  /// Creates a new envelope with its own slot sharing this payload.
  ///
  /// Exhausting the pool is fatal.
  #[inline]
  pub fn make_copy(&self) -> Self {
    self.pool.make_msg(Arc::clone(&self.data))
  }

  /// Destroys the message, returning its slot to the pool.
  ///
  /// Equivalent to dropping the message.
  #[inline]
  pub fn destroy(self) {
    drop(self);
  }
}

impl Drop for Message {
  fn drop(&mut self) {
    if self.pool.release(self.slot) {
      return;
    }

    if cfg!(debug_assertions) {
      fatal!(format!("released message slot {} twice", self.slot));
    }

    error!(
      target: "st_engine",
      slot = %self.slot,
      kind = %self.kind,
      "released message slot twice",
    );
  }
}

impl Debug for Message {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Message")
      .field("kind", &self.kind)
      .field("slot", &self.slot)
      .field("data", &*self.data)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_accessors() {
    let pool: MsgPool = MsgPool::with_capacity(16, 16);
    let message: Message = pool.make_msg(Payload::SetGravity(5));

    assert_eq!(message.msg_type(), MsgType::SetGravity);
    assert_eq!(message.data(), &Payload::SetGravity(5));
    assert!(message.pool().ptr_eq(&pool));
  }

  #[test]
  fn test_make_copy_shares_payload() {
    let pool: MsgPool = MsgPool::with_capacity(16, 16);
    let original: Message = pool.make_msg(Payload::LogInfo("hello".into()));
    let copy: Message = original.make_copy();

    assert_ne!(original.slot(), copy.slot());
    assert!(Arc::ptr_eq(original.shared(), copy.shared()));
    assert_eq!(Arc::count(copy.shared()), 2);
    assert_eq!(pool.live(), 2);

    original.destroy();

    assert_eq!(copy.data(), &Payload::LogInfo("hello".into()));
    assert_eq!(Arc::count(copy.shared()), 1);
    assert_eq!(pool.live(), 1);
  }

  #[test]
  fn test_try_copy_exhausted() {
    let pool: MsgPool = MsgPool::with_capacity(16, 16);
    let held: Vec<Message> = (0..16).map(|_| pool.make_msg(Payload::StopMusic)).collect();

    assert_eq!(held[0].try_copy().unwrap_err(), PoolExhausted);
  }
}
