use crate::loom::sync::atomic::AtomicU32;

/// Frequently modified table state stored in a cache-padded section.
#[repr(C)]
pub(crate) struct Volatile {
  /// The total number of occupied slots.
  pub(crate) len: AtomicU32,
  /// Allocation counter for the next slot to hand out.
  pub(crate) aid: AtomicU32,
  /// Free counter for the next slot to return to the free ring.
  pub(crate) fid: AtomicU32,
}

impl Volatile {
  #[inline]
  pub(crate) fn new() -> Self {
    Self {
      len: AtomicU32::new(0),
      aid: AtomicU32::new(0),
      fid: AtomicU32::new(0),
    }
  }
}
