//! Low-level building blocks shared by the message pool and task manager.
//!
//! - [`SlotTable`]: lock-free, fixed-capacity table of generation-tagged
//!   identifiers
//! - [`SlotId`]: identifier handed out by a [`SlotTable`]

mod macros;
mod slot_id;
mod slot_table;

pub(crate) use self::macros::fatal;

pub use self::slot_id::SlotId;
pub use self::slot_table::SlotInsertError;
pub use self::slot_table::SlotTable;
pub use self::slot_table::SlotTableKeys;
