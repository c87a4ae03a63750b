mod error;
mod state;
mod table;
mod utils;

pub use self::error::SlotInsertError;

pub(crate) use self::state::ReadOnly;
pub(crate) use self::state::Volatile;

pub use self::table::SlotTable;
pub use self::table::SlotTableKeys;

pub(crate) use self::utils::Geometry;
pub(crate) use self::utils::Index;
pub(crate) use self::utils::Permit;
pub(crate) use self::utils::Stripes;
