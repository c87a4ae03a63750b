use crossbeam_utils::CachePadded;

/// Size and striping of a slot table.
///
/// A table holds `2^order` slots split into `2^block_order` blocks of
/// [`LANES`] slots each, one block per cache line.
///
/// [`LANES`]: Self::LANES
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Geometry {
  order: u32,
  block_order: u32,
}

impl Geometry {
  /// Number of 64-bit slots sharing one cache line.
  pub(crate) const LANES: usize = size_of::<CachePadded<u8>>() / size_of::<u64>();

  /// log2 of [`LANES`](Self::LANES).
  pub(crate) const LANE_ORDER: u32 = {
    assert!(Self::LANES.is_power_of_two(), "cache line must hold a power of two of slots");
    Self::LANES.trailing_zeros()
  };

  /// A table never spans less than one full block.
  pub(crate) const MIN_ORDER: u32 = if Self::LANE_ORDER > 4 { Self::LANE_ORDER } else { 4 };
  pub(crate) const MAX_ORDER: u32 = 24;
  pub(crate) const DEF_ORDER: u32 = 10;

  /// Returns the geometry of the smallest table holding `capacity` slots.
  ///
  /// Capacities outside the supported range are clamped.
  pub(crate) const fn for_capacity(capacity: usize) -> Self {
    let order: u32 = match capacity.checked_next_power_of_two() {
      Some(rounded) if rounded.trailing_zeros() < Self::MIN_ORDER => Self::MIN_ORDER,
      Some(rounded) if rounded.trailing_zeros() > Self::MAX_ORDER => Self::MAX_ORDER,
      Some(rounded) => rounded.trailing_zeros(),
      None => Self::MAX_ORDER,
    };

    Self {
      order,
      block_order: order - Self::LANE_ORDER,
    }
  }

  /// Total number of slots.
  #[inline]
  pub(crate) const fn len(self) -> usize {
    1 << self.order
  }

  /// Number of cache-line blocks.
  #[inline]
  pub(crate) const fn blocks(self) -> usize {
    1 << self.block_order
  }

  #[inline]
  pub(crate) const fn block_order(self) -> u32 {
    self.block_order
  }

  /// Bits of a serial that select the slot.
  #[inline]
  pub(crate) const fn entry_mask(self) -> u64 {
    self.len() as u64 - 1
  }

  #[inline]
  pub(crate) const fn block_mask(self) -> u64 {
    self.blocks() as u64 - 1
  }

  #[inline]
  pub(crate) const fn lane_mask(self) -> u64 {
    Self::LANES as u64 - 1
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
