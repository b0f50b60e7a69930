//! The four typed coordinate stores and the union column that owns them.
//!
//! Each store keeps a flat buffer of interleaved xy coordinates plus zero to
//! three levels of offset arrays encoding multi-part and multi-ring
//! structure. Offsets are validated once at construction; every later
//! transform is offset arithmetic over shared buffers.

pub use coord::CoordBuffer;
pub use linestring::LineStringArray;
pub use multipoint::MultiPointArray;
pub use point::PointArray;
pub use polygon::PolygonArray;
pub use union::GeoColumn;

mod coord;
mod linestring;
mod multipoint;
mod point;
mod polygon;
mod union;
pub(crate) mod util;
