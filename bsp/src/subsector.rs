use crate::mesh::{HalfEdgeId, Mesh};
use crate::DIST_EPSILON;
use log::{error, warn};
use map::SectorId;
use math::{bams_atan2, Aabb, Vec2d, Vector};
use std::cmp::Reverse;
use std::collections::HashSet;

pub type SubsectorId = usize;

/// Minimum triangle area for a half-edge to anchor a triangle fan. Below
/// this, fan triangles degenerate and renderers z-fight.
const TRIFAN_LIMIT: f64 = 0.1;

/// Floor textures tile on a fixed 64-unit world grid.
const WORLD_GRID: f64 = 64.0;

/// A convex BSP leaf: a closed clockwise ring of half-edges enclosing part
/// of one sector.
pub struct Subsector {
    pub hedges: Vec<HalfEdgeId>,
    pub sector: Option<SectorId>,
    pub bounds: Aabb,
    pub mid_point: Vec2d,
    /// Half-edge whose start vertex can fan-triangulate the whole ring, or
    /// `None` when only fanning from `mid_point` avoids degenerate slivers.
    pub fan_base: Option<HalfEdgeId>,
    pub world_grid_offset: Vec2d,
}

impl Subsector {
    pub fn new(mesh: &Mesh, hedges: Vec<HalfEdgeId>) -> Subsector {
        let mut bounds = Aabb::from_point(mesh.half_edge(hedges[0]).geom.start);
        for &id in &hedges {
            let geom = &mesh.half_edge(id).geom;
            bounds.include(geom.start);
            bounds.include(geom.end);
        }
        Subsector {
            hedges,
            sector: None,
            bounds,
            mid_point: Vec2d::new(0.0, 0.0),
            fan_base: None,
            world_grid_offset: Vec2d::new(0.0, 0.0),
        }
    }

    /// Order the ring, link it into the mesh, and resolve the leaf's sector
    /// and render hints. Runs once per subsector after the tree is built.
    pub fn finish(
        &mut self,
        mesh: &mut Mesh,
        index: SubsectorId,
        warned_pairs: &mut HashSet<(SectorId, SectorId)>,
    ) {
        let mut mid = Vec2d::new(0.0, 0.0);
        for &id in &self.hedges {
            mid = mid + mesh.half_edge(id).geom.start;
        }
        self.mid_point = mid / self.hedges.len() as f64;

        // Clockwise around the midpoint, so each half-edge keeps the leaf
        // interior on its right.
        let mid = self.mid_point;
        self.hedges.sort_by_key(|&id| {
            let start = mesh.half_edge(id).geom.start;
            let toward = start - mid;
            Reverse(bams_atan2(toward[1], toward[0]))
        });

        for (position, &id) in self.hedges.iter().enumerate() {
            let next = self.hedges[(position + 1) % self.hedges.len()];
            let gap = mesh.half_edge(next).geom.start - mesh.half_edge(id).geom.end;
            if gap.squared_norm() > DIST_EPSILON * DIST_EPSILON {
                warn!(
                    "Subsector {} ring has a gap of {} units",
                    index,
                    gap.norm()
                );
            }
        }
        mesh.link_ring(&self.hedges);

        self.sector = self.resolve_sector(mesh, index, warned_pairs);
        self.fan_base = self.pick_fan_base(mesh);
        self.world_grid_offset = Vec2d::new(
            self.bounds.min[0] % WORLD_GRID,
            self.bounds.min[1] % WORLD_GRID,
        );
    }

    fn resolve_sector(
        &self,
        mesh: &Mesh,
        index: SubsectorId,
        warned_pairs: &mut HashSet<(SectorId, SectorId)>,
    ) -> Option<SectorId> {
        let mut resolved: Option<SectorId> = None;
        for &id in &self.hedges {
            let hedge = mesh.half_edge(id);
            if hedge.is_mini() {
                continue;
            }
            let sector = match hedge.sector {
                Some(sector) => sector,
                None => continue,
            };
            match resolved {
                None => resolved = Some(sector),
                Some(first) if first != sector => {
                    let pair = (first.min(sector), first.max(sector));
                    if warned_pairs.insert(pair) {
                        warn!(
                            "Subsector {} mixes sectors {} and {}; keeping {}",
                            index, pair.0, pair.1, first
                        );
                    }
                }
                Some(_) => {}
            }
        }
        if resolved.is_none() {
            error!("Subsector {} has no real half-edges", index);
            resolved = self
                .hedges
                .iter()
                .find_map(|&id| mesh.half_edge(id).sector);
        }
        resolved
    }

    /// First half-edge whose start vertex sees every non-adjacent ring edge
    /// at a usable triangle area.
    fn pick_fan_base(&self, mesh: &Mesh) -> Option<HalfEdgeId> {
        self.hedges.iter().cloned().find(|&candidate| {
            let apex_vertex = mesh.half_edge(candidate).start;
            let apex = mesh.half_edge(candidate).geom.start;
            self.hedges.iter().all(|&other| {
                let hedge = mesh.half_edge(other);
                if hedge.start == apex_vertex || hedge.end == apex_vertex {
                    return true;
                }
                let doubled = (hedge.geom.start - apex).cross(&(hedge.geom.end - apex));
                // Clockwise rings sweep negative cross products.
                -doubled * 0.5 > TRIFAN_LIMIT
            })
        })
    }

    /// Point-in-convex-polygon test against the ring; boundary counts as
    /// inside.
    pub fn point_inside(&self, mesh: &Mesh, point: Vec2d) -> bool {
        self.hedges.iter().all(|&id| {
            mesh.half_edge(id).geom.line.signed_distance(&point) >= 0.0
        })
    }
}

#[cfg(test)]
mod test {
    use crate::test_support::GeometryBuilder;
    use crate::{build, BspData, Config};
    use math::Vec2d;

    fn square_data() -> BspData {
        crate::test_support::init_logging();
        let mut builder = GeometryBuilder::new();
        let sector = builder.add_sector();
        builder.ring(sector, &[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]);
        build(&builder.build(), &Config::default()).expect("build failed")
    }

    #[test]
    fn square_subsector_hints() {
        let data = square_data();
        let subsector = &data.tree.subsectors()[0];
        assert_eq!(subsector.mid_point, Vec2d::new(2.0, 2.0));
        assert_eq!(subsector.world_grid_offset, Vec2d::new(0.0, 0.0));
        // A convex square fans from any vertex.
        assert!(subsector.fan_base.is_some());
    }

    #[test]
    fn point_inside_respects_the_ring() {
        let data = square_data();
        let subsector = &data.tree.subsectors()[0];
        assert!(subsector.point_inside(&data.mesh, Vec2d::new(2.0, 2.0)));
        assert!(subsector.point_inside(&data.mesh, Vec2d::new(0.0, 2.0)));
        assert!(!subsector.point_inside(&data.mesh, Vec2d::new(5.0, 2.0)));
        assert!(!subsector.point_inside(&data.mesh, Vec2d::new(-0.5, -0.5)));
    }

    #[test]
    fn grid_offset_follows_the_bounds() {
        let mut builder = GeometryBuilder::new();
        let sector = builder.add_sector();
        builder.ring(
            sector,
            &[(70.0, 10.0), (70.0, 50.0), (110.0, 50.0), (110.0, 10.0)],
        );
        let data = build(&builder.build(), &Config::default()).expect("build failed");
        let subsector = &data.tree.subsectors()[0];
        assert_eq!(subsector.world_grid_offset, Vec2d::new(6.0, 10.0));
    }
}
