use std::marker::PhantomData;

use crate::core::SlotTable;

/// A marker representing the right to claim one slot in the table.
#[repr(transparent)]
pub(crate) struct Permit<'table> {
  marker: PhantomData<&'table SlotTable>,
}

impl<'table> Permit<'table> {
  #[inline]
  pub(crate) const fn new(_table: &'table SlotTable) -> Self {
    Self {
      marker: PhantomData,
    }
  }
}
