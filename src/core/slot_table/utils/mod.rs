mod geometry;
mod index;
mod permit;
mod stripes;

pub(crate) use self::geometry::Geometry;
pub(crate) use self::index::Index;
pub(crate) use self::permit::Permit;
pub(crate) use self::stripes::Stripes;
