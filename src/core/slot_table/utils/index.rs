use std::marker::PhantomData;

use crate::core::slot_table::ReadOnly;

/// A concrete array index produced by (and only valid for) one table.
#[repr(transparent)]
pub(crate) struct Index<'table> {
  source: usize,
  marker: PhantomData<&'table ReadOnly>,
}

impl<'table> Index<'table> {
  #[inline]
  pub(crate) const fn new(_table: &'table ReadOnly, source: usize) -> Self {
    Self {
      source,
      marker: PhantomData,
    }
  }

  #[inline]
  pub(crate) const fn get(self) -> usize {
    self.source
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
