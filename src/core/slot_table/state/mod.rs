mod readonly;
mod volatile;

pub(crate) use self::readonly::ReadOnly;
pub(crate) use self::volatile::Volatile;
pub(crate) use self::readonly::VACANT;
