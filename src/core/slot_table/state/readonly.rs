use crate::core::SlotId;
use crate::core::slot_table::Geometry;
use crate::core::slot_table::Index;
use crate::core::slot_table::Stripes;

/// Marks a concrete slot that holds no live identifier.
pub(crate) const VACANT: u64 = u64::MAX;

/// Table storage and geometry, fixed after construction.
pub(crate) struct ReadOnly {
  /// Live serial of each concrete slot, or [`VACANT`].
  pub(crate) concrete_array: Stripes,
  /// Ring of free abstract indices.
  pub(crate) abstract_array: Stripes,
  pub(crate) geometry: Geometry,
}

impl ReadOnly {
  pub(crate) fn new(capacity: usize) -> Self {
    let geometry: Geometry = Geometry::for_capacity(capacity);
    let blocks: usize = geometry.blocks();

    // The free ring starts as the identity over abstract indices, stored at
    // their concrete positions.
    let abstract_array: Stripes = Stripes::new(geometry, |concrete| {
      let lane: usize = concrete & (Geometry::LANES - 1);
      let block: usize = concrete >> Geometry::LANE_ORDER;
      (lane * blocks + block) as u64
    });

    Self {
      concrete_array: Stripes::new(geometry, |_| VACANT),
      abstract_array,
      geometry,
    }
  }

  // ---------------------------------------------------------------------------
  // Index Mapping
  //
  // An abstract index counts allocations: its low bits pick the slot and the
  // remaining bits are the slot's generation. The serial stored in a `SlotId`
  // keeps the generation bits but swaps the slot bits for the concrete index,
  // which scatters consecutive allocations across cache lines.
  //
  // Within the slot bits, the abstract index is `lane:block` and the concrete
  // index is `block:lane`.
  // ---------------------------------------------------------------------------

  #[inline]
  pub(crate) const fn serial_to_abstract(&self, serial: u64) -> u64 {
    let geometry: Geometry = self.geometry;
    let block: u64 = (serial >> Geometry::LANE_ORDER) & geometry.block_mask();
    let lane: u64 = serial & geometry.lane_mask();

    (serial & !geometry.entry_mask()) | (lane << geometry.block_order()) | block
  }

  #[inline]
  pub(crate) const fn serial_to_concrete(&self, serial: u64) -> Index<'_> {
    Index::new(self, (serial & self.geometry.entry_mask()) as usize)
  }

  #[inline]
  pub(crate) const fn id_to_abstract(&self, id: SlotId) -> u64 {
    self.serial_to_abstract(id.serial())
  }

  #[inline]
  pub(crate) const fn id_to_concrete(&self, id: SlotId) -> Index<'_> {
    self.serial_to_concrete(id.serial())
  }

  #[inline]
  pub(crate) const fn abstract_to_concrete(&self, abstract_idx: u64) -> Index<'_> {
    let geometry: Geometry = self.geometry;
    let block: u64 = abstract_idx & geometry.block_mask();
    let lane: u64 = (abstract_idx >> geometry.block_order()) & geometry.lane_mask();

    Index::new(self, ((block << Geometry::LANE_ORDER) | lane) as usize)
  }

  /// Converts an abstract index to the serial handed out in a [`SlotId`].
  #[inline]
  pub(crate) const fn abstract_to_id(&self, abstract_idx: u64) -> SlotId {
    let abstract_idx: u64 = abstract_idx & SlotId::SERIAL_MASK;
    let generation: u64 = abstract_idx & !self.geometry.entry_mask();
    let serial: u64 = generation | self.abstract_to_concrete(abstract_idx).get() as u64;

    debug_assert!(self.serial_to_abstract(serial) == abstract_idx);

    SlotId::from_serial(serial)
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::collections::HashSet;
  use std::sync::atomic::AtomicU64;
  use std::sync::atomic::Ordering;

  use super::*;

  const MIN_ORDER: u32 = Geometry::MIN_ORDER;
  const MAX_ORDER: u32 = 16;

  #[test]
  fn test_abstract_to_concrete_covers_all_slots() {
    for order in MIN_ORDER..=MAX_ORDER {
      let capacity: usize = 1 << order;
      let readonly: ReadOnly = ReadOnly::new(capacity);
      let mut used: HashSet<usize> = HashSet::with_capacity(capacity);

      for abstract_idx in 0..capacity as u64 {
        used.insert(readonly.abstract_to_concrete(abstract_idx).get());
      }

      assert_eq!(used.len(), capacity);
    }
  }

  #[test]
  fn test_abstract_to_id_roundtrip() {
    for order in MIN_ORDER..=MAX_ORDER {
      let capacity: usize = 1 << order;
      let readonly: ReadOnly = ReadOnly::new(capacity);

      for abstract_idx in 0..capacity as u64 {
        let convert: SlotId = readonly.abstract_to_id(abstract_idx);

        assert_eq!(readonly.id_to_abstract(convert), abstract_idx);
        assert_eq!(
          readonly.id_to_concrete(convert).get(),
          readonly.abstract_to_concrete(abstract_idx).get(),
        );
      }
    }
  }

  #[test]
  fn test_generation_preservation() {
    let capacity: u64 = 1 << 10;
    let readonly: ReadOnly = ReadOnly::new(capacity as usize);

    for generation in 0..16 {
      for slot in 0..capacity {
        let abstract_idx: u64 = generation * capacity + slot;
        let convert: SlotId = readonly.abstract_to_id(abstract_idx);

        assert_eq!(readonly.id_to_abstract(convert), abstract_idx);
        assert_eq!(
          readonly.id_to_concrete(convert).get(),
          readonly.abstract_to_concrete(slot).get(),
        );
      }
    }
  }

  #[test]
  fn test_concrete_array_starts_vacant() {
    let readonly: ReadOnly = ReadOnly::new(64);

    for index in 0..readonly.concrete_array.len() {
      let entry: &AtomicU64 = readonly.concrete_array.word(index).unwrap();
      assert_eq!(entry.load(Ordering::Relaxed), VACANT);
    }
  }

  #[test]
  fn test_free_ring_starts_as_identity() {
    let readonly: ReadOnly = ReadOnly::new(256);

    for abstract_idx in 0..256_u64 {
      let concrete: Index<'_> = readonly.abstract_to_concrete(abstract_idx);
      assert_eq!(readonly.abstract_array.get(concrete).load(Ordering::Relaxed), abstract_idx);
    }
  }
}
