use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Error returned when every slot of a [`SlotTable`] is occupied.
///
/// [`SlotTable`]: crate::core::SlotTable
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct SlotInsertError;

impl Display for SlotInsertError {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    f.write_str("too many slots")
  }
}

impl Error for SlotInsertError {}
