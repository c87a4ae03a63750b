use std::error::Error;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::OnceLock;
use tracing::warn;
use triomphe::Arc;

use crate::bus::Message;
use crate::bus::Payload;
use crate::consts;
use crate::core::SlotId;
use crate::core::SlotTable;
use crate::core::fatal;

// -----------------------------------------------------------------------------
// Pool Exhausted Error
// -----------------------------------------------------------------------------

/// Error returned when every message slot is in use and the pool may not
/// grow any further.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct PoolExhausted;

impl Display for PoolExhausted {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("message pool exhausted")
  }
}

impl Error for PoolExhausted {}

// -----------------------------------------------------------------------------
// Message Pool
// -----------------------------------------------------------------------------

/// Number of slot table segments a pool may own.
const MAX_SEGMENTS: usize = 1 << SlotId::SEGMENT_BITS;

/// A growable pool of message slots.
///
/// Slots live in a list of [`SlotTable`] segments. The first segment is
/// allocated up front; when every slot is taken a new segment twice the size
/// of the previous one is added, up to the configured hard cap. Segments are
/// never freed, so a slot identifier stays valid for the lifetime of the
/// pool.
///
/// Cloning a pool is cheap and yields another handle to the same slots.
#[derive(Clone)]
pub struct MsgPool {
  inner: Arc<PoolInner>,
}

struct PoolInner {
  segments: [OnceLock<SlotTable>; MAX_SEGMENTS],
  base: usize,
  hard_cap: usize,
}

impl MsgPool {
  /// Creates a new pool using the default capacity and hard cap.
  #[inline]
  pub fn new() -> Self {
    Self::with_capacity(
      consts::DEFAULT_MSG_POOL_CAPACITY,
      consts::DEFAULT_MSG_POOL_HARD_CAP,
    )
  }

  /// Creates a new pool with at least `capacity` slots that may grow up to
  /// `hard_cap` slots in total.
  ///
  /// The first segment is always allocated, even if it exceeds `hard_cap`.
  pub fn with_capacity(capacity: usize, hard_cap: usize) -> Self {
    let first: SlotTable = SlotTable::with_capacity(capacity);
    let base: usize = first.capacity();

    let segments: [OnceLock<SlotTable>; MAX_SEGMENTS] = [const { OnceLock::new() }; MAX_SEGMENTS];
    let _ignore: Result<(), SlotTable> = segments[0].set(first);

    Self {
      inner: Arc::new(PoolInner {
        segments,
        base,
        hard_cap,
      }),
    }
  }

  /// Allocates a message carrying `payload`.
  ///
  /// # Errors
  ///
  /// Returns [`PoolExhausted`] if every slot is taken and the pool has
  /// reached its hard cap.
  #[inline]
  pub fn try_make_msg<T>(&self, payload: T) -> Result<Message, PoolExhausted>
  where
    T: Into<Arc<Payload>>,
  {
    let slot: SlotId = self.acquire()?;
    Ok(Message::new(self.clone(), slot, payload.into()))
  }

  /// Allocates a message carrying `payload`.
  ///
  /// Exhausting the pool is fatal: the process prints a diagnostic and
  /// aborts.
  #[inline]
  pub fn make_msg<T>(&self, payload: T) -> Message
  where
    T: Into<Arc<Payload>>,
  {
    match self.try_make_msg(payload) {
      Ok(message) => message,
      Err(error) => fatal!(error),
    }
  }

  /// Returns the number of slots currently in use.
  pub fn live(&self) -> usize {
    self.tables().map(SlotTable::len).sum()
  }

  /// Returns the number of slots across all allocated segments.
  pub fn capacity(&self) -> usize {
    self.tables().map(SlotTable::capacity).sum()
  }

  /// Returns the number of allocated segments.
  pub fn segments(&self) -> usize {
    self.tables().count()
  }

  /// Returns `true` if `slot` names a slot that is currently in use.
  pub fn is_live(&self, slot: SlotId) -> bool {
    self
      .table(slot.segment())
      .is_some_and(|table| table.exists(slot.local()))
  }

  /// Returns the identifiers of every slot currently in use.
  pub fn live_slots(&self) -> Vec<SlotId> {
    self
      .tables()
      .enumerate()
      .flat_map(|(segment, table)| table.keys().map(move |slot| slot.with_segment(segment)))
      .collect()
  }

  /// Returns `true` if both handles refer to the same pool.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }

  /// Returns `slot` to the pool; `false` if it was not in use.
  pub(crate) fn release(&self, slot: SlotId) -> bool {
    self
      .table(slot.segment())
      .is_some_and(|table| table.remove(slot.local()))
  }

  fn acquire(&self) -> Result<SlotId, PoolExhausted> {
    for segment in 0..MAX_SEGMENTS {
      let Some(table) = self.table(segment).or_else(|| self.grow(segment)) else {
        break;
      };

      if let Ok(slot) = table.insert() {
        return Ok(slot.with_segment(segment));
      }
    }

    Err(PoolExhausted)
  }

  fn grow(&self, segment: usize) -> Option<&SlotTable> {
    let capacity: usize = self.segment_capacity(segment);
    let previous: usize = (0..segment).map(|index| self.segment_capacity(index)).sum();

    if previous + capacity > self.inner.hard_cap {
      return None;
    }

    let table: &SlotTable = self.inner.segments[segment].get_or_init(|| {
      warn!(
        target: "st_engine",
        segment,
        capacity,
        total = previous + capacity,
        "message pool exhausted, growing",
      );

      SlotTable::with_capacity(capacity)
    });

    Some(table)
  }

  #[inline]
  fn segment_capacity(&self, segment: usize) -> usize {
    SlotTable::actual_capacity(self.inner.base.saturating_mul(1 << segment))
  }

  #[inline]
  fn table(&self, segment: usize) -> Option<&SlotTable> {
    self.inner.segments.get(segment).and_then(OnceLock::get)
  }

  #[inline]
  fn tables(&self) -> impl Iterator<Item = &SlotTable> {
    self.inner.segments.iter().map_while(OnceLock::get)
  }
}

impl Default for MsgPool {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl Debug for MsgPool {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("MsgPool")
      .field("live", &self.live())
      .field("capacity", &self.capacity())
      .field("segments", &self.segments())
      .field("hard_cap", &self.inner.hard_cap)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
