use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Generation-tagged identifier of an occupied slot.
///
/// The low [`SERIAL_BITS`] bits hold the table-local serial (concrete slot
/// index plus generation counter); the next [`SEGMENT_BITS`] bits name the
/// table segment the slot belongs to. Reusing a slot yields a new serial, so
/// a stale identifier never matches the slot's current occupant.
///
/// ```text
/// ┌────────────┬─────────┬──────────────────────────────────┐
/// │ unused: 20 │ seg: 4  │ serial (generation | index): 40  │
/// └────────────┴─────────┴──────────────────────────────────┘
/// ```
///
/// [`SERIAL_BITS`]: Self::SERIAL_BITS
/// [`SEGMENT_BITS`]: Self::SEGMENT_BITS
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SlotId {
  bits: u64,
}

impl SlotId {
  /// Number of bits used by the table-local serial.
  pub const SERIAL_BITS: u32 = 40;
  /// Mask selecting the table-local serial.
  pub const SERIAL_MASK: u64 = (1 << Self::SERIAL_BITS) - 1;

  /// Number of bits used by the segment index.
  pub const SEGMENT_BITS: u32 = 4;
  /// Mask selecting the segment index (after shifting).
  pub const SEGMENT_MASK: u64 = (1 << Self::SEGMENT_BITS) - 1;

  #[inline]
  pub(crate) const fn from_serial(serial: u64) -> Self {
    Self {
      bits: serial & Self::SERIAL_MASK,
    }
  }

  /// Creates an identifier from its raw bit representation.
  #[inline]
  pub const fn from_bits(bits: u64) -> Self {
    Self {
      bits: bits & ((Self::SEGMENT_MASK << Self::SERIAL_BITS) | Self::SERIAL_MASK),
    }
  }

  /// Returns the raw bit representation of this identifier.
  #[inline]
  pub const fn into_bits(self) -> u64 {
    self.bits
  }

  /// Returns the table-local serial.
  #[inline]
  pub const fn serial(self) -> u64 {
    self.bits & Self::SERIAL_MASK
  }

  /// Returns the index of the segment owning this slot.
  #[inline]
  pub const fn segment(self) -> usize {
    ((self.bits >> Self::SERIAL_BITS) & Self::SEGMENT_MASK) as usize
  }

  /// Returns the identifier with the segment replaced by `segment`.
  #[inline]
  pub(crate) const fn with_segment(self, segment: usize) -> Self {
    let segment: u64 = (segment as u64 & Self::SEGMENT_MASK) << Self::SERIAL_BITS;

    Self {
      bits: self.serial() | segment,
    }
  }

  /// Returns the identifier with the segment cleared.
  #[inline]
  pub(crate) const fn local(self) -> Self {
    Self::from_serial(self.bits)
  }
}

impl Debug for SlotId {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Display::fmt(self, f)
  }
}

impl Display for SlotId {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    write!(f, "#Slot<{}.{}>", self.segment(), self.serial())
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_segment_roundtrip() {
    for segment in 0..=SlotId::SEGMENT_MASK as usize {
      let slot: SlotId = SlotId::from_serial(12345).with_segment(segment);

      assert_eq!(slot.segment(), segment);
      assert_eq!(slot.serial(), 12345);
      assert_eq!(slot.local(), SlotId::from_serial(12345));
    }
  }

  #[test]
  fn test_serial_is_masked() {
    let slot: SlotId = SlotId::from_serial(u64::MAX);

    assert_eq!(slot.serial(), SlotId::SERIAL_MASK);
    assert_eq!(slot.segment(), 0);
  }

  #[test]
  fn test_from_bits_drops_unused() {
    let slot: SlotId = SlotId::from_bits(u64::MAX);

    assert_eq!(slot.segment(), SlotId::SEGMENT_MASK as usize);
    assert_eq!(slot.serial(), SlotId::SERIAL_MASK);
    assert_eq!(SlotId::from_bits(slot.into_bits()), slot);
  }

  #[test]
  fn test_display() {
    let slot: SlotId = SlotId::from_serial(7).with_segment(2);

    assert_eq!(format!("{slot}"), "#Slot<2.7>");
    assert_eq!(format!("{slot:?}"), "#Slot<2.7>");
  }
}
