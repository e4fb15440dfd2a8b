mod errors;
mod geometry;

pub mod types;

pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::geometry::Geometry;
pub use crate::types::{
    Coord, LightLevel, Linedef, LinedefFlags, LinedefId, MaterialId, Sector, SectorId, SectorTag,
    SectorType, Sidedef, SidedefId, SpecialType, Vertex, VertexId, NO_SIDEDEF,
};
