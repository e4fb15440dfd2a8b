use crate::errors::{Error, Result};
use crate::types::{Linedef, LinedefId, Sector, SectorId, Sidedef, Vertex, VertexId, NO_SIDEDEF};
use log::info;
use math::{Aabb, Vec2d};

/// The raw level mesh as materialised by the loader: plain arrays of
/// vertices, linedefs, sidedefs and sectors. Purely data; everything
/// derived (half-edges, the partition, blockmaps) lives elsewhere.
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub linedefs: Vec<Linedef>,
    pub sidedefs: Vec<Sidedef>,
    pub sectors: Vec<Sector>,
}

impl Geometry {
    /// Check every cross-array reference. Out-of-range indices are a fatal
    /// load error; nothing downstream is expected to cope with them.
    pub fn validate(&self) -> Result<()> {
        for (index, linedef) in self.linedefs.iter().enumerate() {
            for &vertex in &[linedef.start_vertex, linedef.end_vertex] {
                if vertex as usize >= self.vertices.len() {
                    return Err(Error::bad_vertex_ref(
                        index,
                        i64::from(vertex),
                        self.vertices.len(),
                    ));
                }
            }
            for &side in &[linedef.right_side, linedef.left_side] {
                if side != NO_SIDEDEF && (side < 0 || side as usize >= self.sidedefs.len()) {
                    return Err(Error::bad_sidedef_ref(
                        index,
                        i64::from(side),
                        self.sidedefs.len(),
                    ));
                }
            }
        }
        for (index, sidedef) in self.sidedefs.iter().enumerate() {
            if sidedef.sector as usize >= self.sectors.len() {
                return Err(Error::bad_sector_ref(
                    index,
                    i64::from(sidedef.sector),
                    self.sectors.len(),
                ));
            }
        }
        info!(
            "Validated geometry: {} vertices, {} linedefs, {} sidedefs, {} sectors",
            self.vertices.len(),
            self.linedefs.len(),
            self.sidedefs.len(),
            self.sectors.len()
        );
        Ok(())
    }

    pub fn vertex(&self, id: VertexId) -> Option<Vec2d> {
        self.vertices
            .get(id as usize)
            .map(|vertex| Vec2d::new(vertex.x, vertex.y))
    }

    pub fn linedef(&self, id: LinedefId) -> Option<&Linedef> {
        self.linedefs.get(id as usize)
    }

    pub fn right_sidedef(&self, linedef: &Linedef) -> Option<&Sidedef> {
        match linedef.right_side {
            NO_SIDEDEF => None,
            index => self.sidedefs.get(index as usize),
        }
    }

    pub fn left_sidedef(&self, linedef: &Linedef) -> Option<&Sidedef> {
        match linedef.left_side {
            NO_SIDEDEF => None,
            index => self.sidedefs.get(index as usize),
        }
    }

    pub fn sidedef_sector(&self, sidedef: &Sidedef) -> Option<&Sector> {
        self.sectors.get(sidedef.sector as usize)
    }

    pub fn front_sector_id(&self, linedef: &Linedef) -> Option<SectorId> {
        self.right_sidedef(linedef).map(|side| side.sector)
    }

    pub fn back_sector_id(&self, linedef: &Linedef) -> Option<SectorId> {
        self.left_sidedef(linedef).map(|side| side.sector)
    }

    pub fn linedef_vertices(&self, linedef: &Linedef) -> Option<(Vec2d, Vec2d)> {
        match (
            self.vertex(linedef.start_vertex),
            self.vertex(linedef.end_vertex),
        ) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(
            self.vertices
                .iter()
                .map(|vertex| Vec2d::new(vertex.x, vertex.y)),
        )
    }
}
