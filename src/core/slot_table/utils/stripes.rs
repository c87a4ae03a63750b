use crossbeam_utils::CachePadded;
use std::array;

use crate::core::slot_table::Geometry;
use crate::core::slot_table::Index;
use crate::loom::sync::atomic::AtomicU64;

type Line = [AtomicU64; Geometry::LANES];

/// Fixed array of atomic slot words, one cache line per block.
pub(crate) struct Stripes {
  lines: Box<[CachePadded<Line>]>,
}

impl Stripes {
  /// Allocates `geometry.len()` words, setting word `n` to `init(n)`.
  pub(crate) fn new<F>(geometry: Geometry, init: F) -> Self
  where
    F: Fn(usize) -> u64,
  {
    let lines: Box<[CachePadded<Line>]> = (0..geometry.blocks())
      .map(|block| {
        let base: usize = block << Geometry::LANE_ORDER;
        CachePadded::new(array::from_fn(|lane| AtomicU64::new(init(base | lane))))
      })
      .collect();

    Self { lines }
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.lines.len() * Geometry::LANES
  }

  #[inline]
  pub(crate) fn get(&self, index: Index<'_>) -> &AtomicU64 {
    let index: usize = index.get();
    &self.lines[index >> Geometry::LANE_ORDER][index & (Geometry::LANES - 1)]
  }

  /// Returns the word at flat position `index`, if in range.
  #[inline]
  pub(crate) fn word(&self, index: usize) -> Option<&AtomicU64> {
    self
      .lines
      .get(index >> Geometry::LANE_ORDER)
      .map(|line| &line[index & (Geometry::LANES - 1)])
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::sync::atomic::Ordering;

  use super::*;

  #[test]
  fn test_lines_are_aligned() {
    let stripes: Stripes = Stripes::new(Geometry::for_capacity(256), |_| 0);

    for line in stripes.lines.iter() {
      let address: usize = (line as *const CachePadded<Line>).addr();
      assert_eq!(address % align_of::<CachePadded<u8>>(), 0);
    }
  }

  #[test]
  fn test_init_by_flat_position() {
    let geometry: Geometry = Geometry::for_capacity(64);
    let stripes: Stripes = Stripes::new(geometry, |index| index as u64 * 3);

    assert_eq!(stripes.len(), geometry.len());

    for index in 0..geometry.len() {
      assert_eq!(stripes.word(index).unwrap().load(Ordering::Relaxed), index as u64 * 3);
    }

    assert!(stripes.word(geometry.len()).is_none());
  }
}
