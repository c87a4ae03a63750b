//! Lock-free table of generation-tagged slot identifiers.
//!
//! [`SlotTable`] hands out [`SlotId`]s from a fixed number of slots. Every
//! operation is a handful of atomic instructions; no locks are taken and no
//! memory is allocated after construction.
//!
//! # Architecture
//!
//! The table uses a two-level slot allocation scheme:
//!
//! 1. **Abstract indices**: Allocation counters cycling through a free ring
//! 2. **Concrete indices**: Physical locations in cache-line-aligned blocks
//!
//! # Memory Layout
//!
//! Entries are organized into cache-line-sized blocks to reduce contention:
//!
//! ```text
//! ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌───────────┐
//! │ 0 4 8 12 │ │ 1 5 9 13 │ │ 2 6 10 14 │ │ 3 7 11 15 │
//! └──────────┘ └──────────┘ └───────────┘ └───────────┘
//! │Cache-line│ │Cache-line│ │Cache-line │ │Cache-line │
//! ```
//!
//! Sequential allocation spreads entries across blocks, with each block
//! residing in its own cache line.

use crossbeam_utils::CachePadded;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::core::SlotId;
use crate::core::SlotInsertError;
use crate::core::slot_table::Index;
use crate::core::slot_table::Geometry;
use crate::core::slot_table::Permit;
use crate::core::slot_table::ReadOnly;
use crate::core::slot_table::Volatile;
use crate::core::slot_table::state::VACANT;
use crate::loom::sync::atomic::AtomicU64;
use crate::loom::sync::atomic::Ordering::AcqRel;
use crate::loom::sync::atomic::Ordering::Acquire;
use crate::loom::sync::atomic::Ordering::Relaxed;
use crate::loom::sync::atomic::Ordering::Release;

const RESERVED: u64 = u64::MAX;

// -----------------------------------------------------------------------------
// Slot Table Iterator
// -----------------------------------------------------------------------------

/// Iterator over the identifiers currently held in a [`SlotTable`].
///
/// Concurrent insertions or removals do not invalidate the iterator, though
/// yielded identifiers may have been released since.
pub struct SlotTableKeys<'table> {
  table: &'table SlotTable,
  index: usize,
}

impl<'table> SlotTableKeys<'table> {
  #[inline]
  const fn new(table: &'table SlotTable) -> Self {
    Self { table, index: 0 }
  }
}

impl Debug for SlotTableKeys<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("SlotTableKeys(..)")
  }
}

impl Iterator for SlotTableKeys<'_> {
  type Item = SlotId;

  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    while let Some(entry) = self.table.readonly.concrete_array.word(self.index) {
      self.index += 1;

      let serial: u64 = entry.load(Acquire);

      if serial != VACANT {
        return Some(SlotId::from_serial(serial));
      }
    }

    None
  }

  #[inline]
  fn size_hint(&self) -> (usize, Option<usize>) {
    let remaining: usize = self.table.capacity() - self.index;
    (0, Some(remaining))
  }
}

// -----------------------------------------------------------------------------
// Slot Table
// -----------------------------------------------------------------------------

/// Lock-free, cache-line-aware table of [`SlotId`]s.
///
/// # Capacity
///
/// Table capacity is fixed at creation time and must be between
/// [`MIN_ENTRIES`] and [`MAX_ENTRIES`]. Capacity is automatically rounded
/// to the next power of two.
///
/// # Generations
///
/// Releasing a slot advances its generation, so the next identifier handed
/// out for the same concrete slot differs from every recently released one.
///
/// [`MIN_ENTRIES`]: Self::MIN_ENTRIES
/// [`MAX_ENTRIES`]: Self::MAX_ENTRIES
#[repr(C)]
pub struct SlotTable {
  volatile: CachePadded<Volatile>,
  readonly: CachePadded<ReadOnly>,
}

impl SlotTable {
  /// Minimum number of entries supported in the table.
  pub const MIN_ENTRIES: usize = 1 << Geometry::MIN_ORDER;

  /// Maximum number of entries supported in the table.
  pub const MAX_ENTRIES: usize = 1 << Geometry::MAX_ORDER;

  /// Default number of entries in a new table.
  pub const DEF_ENTRIES: usize = 1 << Geometry::DEF_ORDER;

  /// Creates a new, empty table using the default capacity.
  #[inline]
  pub fn new() -> Self {
    Self::with_capacity(Self::DEF_ENTRIES)
  }

  /// Creates a new, empty table with at least `capacity` slots.
  ///
  /// The actual capacity will be rounded up to the next power of two and
  /// clamped between [`MIN_ENTRIES`] and [`MAX_ENTRIES`].
  ///
  /// [`MIN_ENTRIES`]: Self::MIN_ENTRIES
  /// [`MAX_ENTRIES`]: Self::MAX_ENTRIES
  #[inline]
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      volatile: CachePadded::new(Volatile::new()),
      readonly: CachePadded::new(ReadOnly::new(capacity)),
    }
  }

  /// Returns the capacity a table created with `capacity` would have.
  #[inline]
  pub const fn actual_capacity(capacity: usize) -> usize {
    Geometry::for_capacity(capacity).len()
  }

  /// Returns the maximum number of slots the table can hold.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.readonly.concrete_array.len()
  }

  /// Returns the number of occupied slots.
  ///
  /// This value may change immediately after reading due to concurrent
  /// operations in other threads.
  #[inline]
  pub fn len(&self) -> usize {
    self.volatile.len.load(Relaxed) as usize
  }

  /// Returns `true` if no slot is occupied.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Claims a free slot and returns its identifier.
  ///
  /// # Errors
  ///
  /// Returns [`SlotInsertError`] if every slot is occupied.
  ///
  /// # Ordering
  ///
  /// Uses `Release` when publishing the serial so a thread that observes the
  /// slot as occupied with `Acquire` also observes the claim.
  #[inline]
  pub fn insert(&self) -> Result<SlotId, SlotInsertError> {
    let Some(permit) = self.reserve_slot() else {
      return Err(SlotInsertError);
    };

    let abstract_idx: u64 = self.acquire_slot(permit);
    let concrete_idx: Index<'_> = self.readonly.abstract_to_concrete(abstract_idx);
    let id: SlotId = self.readonly.abstract_to_id(abstract_idx);

    let slot: &AtomicU64 = self.readonly.concrete_array.get(concrete_idx);
    let prev: u64 = slot.swap(id.serial(), Release);

    debug_assert_eq!(prev, VACANT, "claimed slot was still occupied");

    Ok(id)
  }

  /// Releases the slot named by `id` and returns `true` if it was occupied.
  ///
  /// Returns `false` for identifiers that were already released (or that
  /// belong to an older generation of the slot). When several threads race
  /// to release the same identifier exactly one of them observes `true`.
  ///
  /// # Ordering
  ///
  /// - Slot exchange: `AcqRel` (acquire the claim, release the vacancy)
  /// - Free ring: `Relaxed` (atomicity only)
  /// - Length: `Release` (make decrement visible)
  #[inline]
  pub fn remove(&self, id: SlotId) -> bool {
    let index: Index<'_> = self.readonly.id_to_concrete(id);
    let entry: &AtomicU64 = self.readonly.concrete_array.get(index);

    if entry
      .compare_exchange(id.serial(), VACANT, AcqRel, Acquire)
      .is_err()
    {
      return false;
    }

    self.release_slot(id);

    let _ignore: u32 = self.volatile.len.fetch_sub(1, Release);

    true
  }

  /// Returns `true` if `id` names a currently occupied slot.
  ///
  /// The result may be stale immediately after returning due to concurrent
  /// operations.
  #[inline]
  pub fn exists(&self, id: SlotId) -> bool {
    let index: Index<'_> = self.readonly.id_to_concrete(id);
    let entry: &AtomicU64 = self.readonly.concrete_array.get(index);

    entry.load(Acquire) == id.serial()
  }

  /// Returns an iterator over all currently occupied identifiers.
  #[inline]
  pub fn keys(&self) -> SlotTableKeys<'_> {
    SlotTableKeys::new(self)
  }

  /// Translates an identifier into its `(index, generation)` components.
  #[inline]
  pub fn translate(&self, id: SlotId) -> (u64, u64) {
    let abstract_idx: u64 = self.readonly.id_to_abstract(id);
    let capacity: u64 = self.capacity() as u64;

    (abstract_idx % capacity, abstract_idx / capacity)
  }

  /// Attempts to reserve a slot in the table.
  ///
  /// The permit does not identify which slot will be claimed; that is
  /// determined later during acquisition.
  #[inline]
  fn reserve_slot(&self) -> Option<Permit<'_>> {
    let prev: u32 = self.volatile.len.fetch_add(1, Relaxed);

    if (prev as usize) < self.capacity() {
      return Some(Permit::new(self));
    }

    let mut current: u32 = prev + 1;

    loop {
      match self
        .volatile
        .len
        .compare_exchange_weak(current, current - 1, Relaxed, Relaxed)
      {
        Ok(_) => break,
        Err(next) => current = next,
      }
    }

    None
  }

  /// Takes the next free abstract index out of the ring.
  #[inline]
  fn acquire_slot(&self, _permit: Permit<'_>) -> u64 {
    loop {
      let abstract_idx: u32 = self.volatile.aid.fetch_add(1, Relaxed);
      let concrete_idx: Index<'_> = self.readonly.abstract_to_concrete(u64::from(abstract_idx));

      let atomic: &AtomicU64 = self.readonly.abstract_array.get(concrete_idx);
      let result: u64 = atomic.swap(RESERVED, AcqRel);

      if result != RESERVED {
        return result;
      }
    }
  }

  /// Returns the next generation of `id`'s slot to the free ring.
  #[inline]
  fn release_slot(&self, id: SlotId) {
    let data: u64 = self.generate_next_slot(id);

    loop {
      let abstract_idx: u32 = self.volatile.fid.fetch_add(1, Relaxed);
      let concrete_idx: Index<'_> = self.readonly.abstract_to_concrete(u64::from(abstract_idx));

      let atomic: &AtomicU64 = self.readonly.abstract_array.get(concrete_idx);
      let result: Result<u64, u64> = atomic.compare_exchange(RESERVED, data, AcqRel, Relaxed);

      if result.is_ok() {
        break;
      }
    }
  }

  #[inline]
  fn generate_next_slot(&self, id: SlotId) -> u64 {
    let data: u64 = self.readonly.id_to_abstract(id);
    (data + self.capacity() as u64) & SlotId::SERIAL_MASK
  }
}

impl Default for SlotTable {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl Debug for SlotTable {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("SlotTable")
      .field("len", &self.volatile.len)
      .field("alloc_cursor", &self.volatile.aid)
      .field("free_cursor", &self.volatile.fid)
      .field("capacity", &self.capacity())
      .field("blocks", &self.readonly.geometry.blocks())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  #[test]
  fn test_new() {
    let table: SlotTable = SlotTable::new();

    assert_eq!(table.capacity(), SlotTable::DEF_ENTRIES);
    assert_eq!(table.len(), 0);
    assert!(table.is_empty());
  }

  #[test]
  fn test_with_capacity_rounds_up_pow2() {
    assert_eq!(SlotTable::with_capacity(100).capacity(), 128);
    assert_eq!(SlotTable::with_capacity(1000).capacity(), 1024);
    assert_eq!(SlotTable::with_capacity(1025).capacity(), 2048);
    assert_eq!(SlotTable::actual_capacity(1025), 2048);
  }

  #[test]
  fn test_with_capacity_clamp() {
    assert_eq!(SlotTable::with_capacity(0).capacity(), SlotTable::MIN_ENTRIES);
    assert_eq!(SlotTable::with_capacity(8).capacity(), SlotTable::MIN_ENTRIES);
    assert_eq!(SlotTable::actual_capacity(usize::MAX), SlotTable::MAX_ENTRIES);
  }

  #[test]
  fn test_insert_single() {
    let table: SlotTable = SlotTable::with_capacity(SlotTable::MIN_ENTRIES);
    let id: SlotId = table.insert().unwrap();

    assert_eq!(table.len(), 1);
    assert!(!table.is_empty());
    assert!(table.exists(id));
    assert_eq!(id.segment(), 0);
  }

  #[test]
  fn test_insert_unique_ids() {
    let table: SlotTable = SlotTable::with_capacity(64);
    let mut ids: HashSet<SlotId> = HashSet::new();

    for _ in 0..64 {
      assert!(ids.insert(table.insert().unwrap()), "duplicate id generated");
    }
  }

  #[test]
  fn test_insert_maximum() {
    let table: SlotTable = SlotTable::with_capacity(32);

    for _ in 0..table.capacity() {
      assert!(table.insert().is_ok());
    }

    assert_eq!(table.len(), 32);
    assert_eq!(table.insert(), Err(SlotInsertError));
    assert_eq!(table.len(), 32);
  }

  #[test]
  fn test_remove_existing() {
    let table: SlotTable = SlotTable::with_capacity(SlotTable::MIN_ENTRIES);
    let id: SlotId = table.insert().unwrap();

    assert!(table.remove(id));
    assert_eq!(table.len(), 0);
    assert!(!table.exists(id));
  }

  #[test]
  fn test_remove_twice() {
    let table: SlotTable = SlotTable::with_capacity(SlotTable::MIN_ENTRIES);
    let id: SlotId = table.insert().unwrap();

    assert!(table.remove(id));
    assert!(!table.remove(id));
    assert_eq!(table.len(), 0);
  }

  #[test]
  fn test_remove_stale_generation() {
    let table: SlotTable = SlotTable::with_capacity(SlotTable::MIN_ENTRIES);
    let mut ids: Vec<SlotId> = Vec::new();

    for _ in 0..table.capacity() {
      ids.push(table.insert().unwrap());
    }

    let stale: SlotId = ids[0];

    assert!(table.remove(stale));

    let fresh: SlotId = table.insert().unwrap();

    assert_ne!(stale, fresh);
    assert_eq!(table.translate(stale).0, table.translate(fresh).0);
    assert_eq!(table.translate(stale).1 + 1, table.translate(fresh).1);

    assert!(!table.remove(stale), "stale id released a live slot");
    assert!(table.exists(fresh));
  }

  #[test]
  fn test_remove_isolation() {
    let table: SlotTable = SlotTable::with_capacity(32);
    let ids: Vec<SlotId> = (0..16).map(|_| table.insert().unwrap()).collect();

    for id in ids.iter().step_by(2) {
      assert!(table.remove(*id));
    }

    assert_eq!(table.len(), 8);

    for (index, id) in ids.iter().enumerate() {
      assert_eq!(table.exists(*id), index % 2 == 1);
    }
  }

  #[test]
  fn test_remove_recycling() {
    let table: SlotTable = SlotTable::with_capacity(SlotTable::MIN_ENTRIES);
    let ids: Vec<SlotId> = (0..table.capacity()).map(|_| table.insert().unwrap()).collect();

    assert_eq!(table.insert(), Err(SlotInsertError));
    assert!(table.remove(ids[3]));

    let new: SlotId = table.insert().unwrap();

    assert!(table.exists(new));
    assert_eq!(table.insert(), Err(SlotInsertError));
  }

  #[test]
  fn test_keys() {
    let table: SlotTable = SlotTable::with_capacity(32);
    let ids: Vec<SlotId> = (0..10).map(|_| table.insert().unwrap()).collect();

    assert!(table.remove(ids[4]));

    let keys: HashSet<SlotId> = table.keys().collect();

    assert_eq!(keys.len(), 9);
    assert!(!keys.contains(&ids[4]));

    for id in ids.iter().filter(|id| **id != ids[4]) {
      assert!(keys.contains(id));
    }
  }

  #[test]
  fn test_id_uniqueness_multiple_generations() {
    let table: SlotTable = SlotTable::with_capacity(SlotTable::MIN_ENTRIES);
    let mut all: HashSet<SlotId> = HashSet::new();

    for _ in 0..10 {
      let round: Vec<SlotId> = (0..16).map(|_| table.insert().unwrap()).collect();

      for id in round {
        assert!(all.insert(id), "id reused across generations");
        assert!(table.remove(id));
      }
    }
  }

  #[test]
  fn test_concurrent_insert_remove() {
    let table: SlotTable = SlotTable::with_capacity(256);

    std::thread::scope(|scope| {
      for _ in 0..4 {
        scope.spawn(|| {
          for _ in 0..1000 {
            let id: SlotId = table.insert().unwrap();
            assert!(table.exists(id));
            assert!(table.remove(id));
          }
        });
      }
    });

    assert!(table.is_empty());
  }
}
