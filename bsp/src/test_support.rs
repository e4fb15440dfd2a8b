//! Small fixture builder for partitioning tests: hand-made level geometry
//! without going through a loader.

use map::{Geometry, Linedef, Sector, SectorId, Sidedef, Vertex, VertexId, NO_SIDEDEF};

/// Turn the logger on for tests that run the whole pipeline, so `RUST_LOG`
/// surfaces builder diagnostics when a scenario fails.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

pub struct GeometryBuilder {
    vertices: Vec<Vertex>,
    linedefs: Vec<Linedef>,
    sidedefs: Vec<Sidedef>,
    sectors: Vec<Sector>,
}

impl GeometryBuilder {
    pub fn new() -> GeometryBuilder {
        GeometryBuilder {
            vertices: Vec::new(),
            linedefs: Vec::new(),
            sidedefs: Vec::new(),
            sectors: Vec::new(),
        }
    }

    pub fn add_sector(&mut self) -> SectorId {
        self.sectors.push(Sector {
            floor_height: 0.0,
            ceiling_height: 128.0,
            floor_material: 0,
            ceiling_material: 0,
            light: 160,
            sector_type: 0,
            tag: 0,
        });
        (self.sectors.len() - 1) as SectorId
    }

    /// A closed one-sided wall loop. Pass the points in clockwise order so
    /// the sector interior ends up on the right of every wall.
    pub fn ring(&mut self, sector: SectorId, points: &[(f64, f64)]) {
        for index in 0..points.len() {
            let from = points[index];
            let to = points[(index + 1) % points.len()];
            self.one_sided(sector, from, to);
        }
    }

    pub fn one_sided(&mut self, sector: SectorId, from: (f64, f64), to: (f64, f64)) {
        let start = self.vertex(from);
        let end = self.vertex(to);
        let right = self.sidedef(sector);
        self.linedefs.push(Linedef {
            start_vertex: start,
            end_vertex: end,
            flags: 0x0001,
            special_type: 0,
            sector_tag: 0,
            right_side: right,
            left_side: NO_SIDEDEF,
            polyobj: false,
        });
    }

    pub fn two_sided(
        &mut self,
        front_sector: SectorId,
        back_sector: SectorId,
        from: (f64, f64),
        to: (f64, f64),
    ) {
        let start = self.vertex(from);
        let end = self.vertex(to);
        let right = self.sidedef(front_sector);
        let left = self.sidedef(back_sector);
        self.linedefs.push(Linedef {
            start_vertex: start,
            end_vertex: end,
            flags: 0x0004,
            special_type: 0,
            sector_tag: 0,
            right_side: right,
            left_side: left,
            polyobj: false,
        });
    }

    pub fn build(self) -> Geometry {
        Geometry {
            vertices: self.vertices,
            linedefs: self.linedefs,
            sidedefs: self.sidedefs,
            sectors: self.sectors,
        }
    }

    fn vertex(&mut self, at: (f64, f64)) -> VertexId {
        let position = Vertex { x: at.0, y: at.1 };
        match self.vertices.iter().position(|vertex| *vertex == position) {
            Some(index) => index as VertexId,
            None => {
                self.vertices.push(position);
                (self.vertices.len() - 1) as VertexId
            }
        }
    }

    fn sidedef(&mut self, sector: SectorId) -> i32 {
        self.sidedefs.push(Sidedef {
            x_offset: 0.0,
            y_offset: 0.0,
            upper_material: 0,
            lower_material: 0,
            middle_material: 0,
            sector,
        });
        (self.sidedefs.len() - 1) as i32
    }
}
