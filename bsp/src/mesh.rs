use crate::DIST_EPSILON;
use idcontain::{Id, IdSlab, OptionId};
use log::{debug, warn};
use map::{Geometry, LinedefId, SectorId};
use math::{bams_atan2, bams_distance, Line2d, Vec2d, Vector, ANGLE_EPSILON};
use vec_map::VecMap;

pub type VertexId = Id<Vertex>;
pub type HalfEdgeId = Id<HalfEdge>;

/// A mesh vertex. Besides its position it carries the vertex's "wall tips":
/// the angularly sorted set of wall directions leaving it, each knowing the
/// sector on either side. The tips answer "which sector occupies the angular
/// gap in direction D?", which drives both window-effect detection results
/// and void detection when stitching partition-line gaps.
pub struct Vertex {
    pub position: Vec2d,
    tips: Vec<WallTip>,
}

#[derive(Copy, Clone, Debug)]
struct WallTip {
    angle: u32,
    left: Option<SectorId>,
    right: Option<SectorId>,
}

/// Precomputed segment coefficients, refreshed whenever an edge is split.
#[derive(Copy, Clone, Debug)]
pub struct EdgeGeom {
    pub start: Vec2d,
    pub end: Vec2d,
    pub delta: Vec2d,
    pub length: f64,
    pub line: Line2d,
}

impl EdgeGeom {
    fn new(start: Vec2d, end: Vec2d) -> EdgeGeom {
        let line = Line2d::from_two_points(start, end);
        EdgeGeom {
            start,
            end,
            delta: end - start,
            length: line.length,
            line,
        }
    }

    pub fn mid(&self) -> Vec2d {
        (self.start + self.end) * 0.5
    }
}

/// A directed edge. Its sector lies on the *right* of its direction of
/// travel (the classic seg convention); the twin covers the other side.
pub struct HalfEdge {
    pub start: VertexId,
    pub end: VertexId,
    pub twin: OptionId<HalfEdge>,
    pub next: OptionId<HalfEdge>,
    pub prev: OptionId<HalfEdge>,

    /// `None` for "mini" edges synthesised along partition lines.
    pub linedef: Option<LinedefId>,
    /// For minis, the linedef whose extension cut this edge into existence.
    pub source_linedef: Option<LinedefId>,
    /// `None` means the void beyond a one-sided boundary.
    pub sector: Option<SectorId>,
    pub is_back: bool,
    pub geom: EdgeGeom,
}

impl HalfEdge {
    pub fn is_mini(&self) -> bool {
        self.linedef.is_none()
    }
}

pub struct SplitResult {
    pub new_vertex: VertexId,
    pub far: HalfEdgeId,
    pub twin_far: Option<HalfEdgeId>,
}

pub struct Mesh {
    vertices: IdSlab<Vertex>,
    half_edges: IdSlab<HalfEdge>,
    all_half_edges: Vec<HalfEdgeId>,
    linedef_half_edges: Vec<Vec<HalfEdgeId>>,
    num_mini: usize,
    num_splits: usize,
}

impl Mesh {
    pub fn from_geometry(geometry: &Geometry) -> Mesh {
        let mut mesh = Mesh {
            vertices: IdSlab::with_capacity(geometry.vertices.len() * 2),
            half_edges: IdSlab::with_capacity(geometry.linedefs.len() * 4),
            all_half_edges: Vec::with_capacity(geometry.linedefs.len() * 4),
            linedef_half_edges: vec![Vec::new(); geometry.linedefs.len()],
            num_mini: 0,
            num_splits: 0,
        };

        let vertex_ids: Vec<VertexId> = geometry
            .vertices
            .iter()
            .map(|vertex| {
                mesh.vertices.insert(Vertex {
                    position: Vec2d::new(vertex.x, vertex.y),
                    tips: Vec::new(),
                })
            })
            .collect();

        let windows = detect_window_effects(geometry);

        for (index, linedef) in geometry.linedefs.iter().enumerate() {
            if linedef.polyobj {
                continue;
            }
            let (start, end) = match geometry.linedef_vertices(linedef) {
                Some(points) => points,
                None => continue,
            };
            if (end - start).squared_norm() < DIST_EPSILON * DIST_EPSILON {
                warn!("Skipping zero-length linedef {}", index);
                continue;
            }

            let front_sector = geometry.front_sector_id(linedef);
            let back_sector = geometry
                .back_sector_id(linedef)
                .or_else(|| windows.get(index).cloned());
            if front_sector.is_none() {
                warn!("Linedef {} has no front sidedef", index);
            }

            let start_id = vertex_ids[linedef.start_vertex as usize];
            let end_id = vertex_ids[linedef.end_vertex as usize];
            let linedef_id = index as LinedefId;

            let front = mesh.half_edges.insert(HalfEdge {
                start: start_id,
                end: end_id,
                twin: OptionId::none(),
                next: OptionId::none(),
                prev: OptionId::none(),
                linedef: Some(linedef_id),
                source_linedef: Some(linedef_id),
                sector: front_sector,
                is_back: false,
                geom: EdgeGeom::new(start, end),
            });
            let back = mesh.half_edges.insert(HalfEdge {
                start: end_id,
                end: start_id,
                twin: OptionId::some(front),
                next: OptionId::none(),
                prev: OptionId::none(),
                linedef: Some(linedef_id),
                source_linedef: Some(linedef_id),
                sector: back_sector,
                is_back: true,
                geom: EdgeGeom::new(end, start),
            });
            mesh.half_edges[front].twin = OptionId::some(back);
            mesh.all_half_edges.push(front);
            mesh.all_half_edges.push(back);
            mesh.linedef_half_edges[index].push(front);
            mesh.linedef_half_edges[index].push(back);

            let delta = end - start;
            mesh.add_wall_tip(
                start_id,
                bams_atan2(delta[1], delta[0]),
                back_sector,
                front_sector,
            );
            mesh.add_wall_tip(
                end_id,
                bams_atan2(-delta[1], -delta[0]),
                front_sector,
                back_sector,
            );
        }

        debug!(
            "Built half-edge mesh: {} vertices, {} half-edges",
            mesh.vertices.len(),
            mesh.all_half_edges.len()
        );
        mesh
    }

    #[inline]
    pub fn half_edge(&self, id: HalfEdgeId) -> &HalfEdge {
        &self.half_edges[id]
    }

    #[inline]
    pub fn half_edge_mut(&mut self, id: HalfEdgeId) -> &mut HalfEdge {
        &mut self.half_edges[id]
    }

    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id]
    }

    #[inline]
    pub fn position(&self, id: VertexId) -> Vec2d {
        self.vertices[id].position
    }

    pub fn half_edge_ids(&self) -> &[HalfEdgeId] {
        &self.all_half_edges
    }

    pub fn linedef_half_edges(&self, linedef: LinedefId) -> &[HalfEdgeId] {
        &self.linedef_half_edges[linedef as usize]
    }

    /// Half-edges that take part in partitioning: every edge that bounds an
    /// actual sector. Synthetic void-side twins stay out of the build and
    /// only exist to keep twin links total.
    pub fn buildable_half_edges(&self) -> Vec<HalfEdgeId> {
        self.all_half_edges
            .iter()
            .cloned()
            .filter(|&id| self.half_edges[id].sector.is_some())
            .collect()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_half_edges(&self) -> usize {
        self.all_half_edges.len()
    }

    pub fn num_mini_half_edges(&self) -> usize {
        self.num_mini
    }

    pub fn num_splits(&self) -> usize {
        self.num_splits
    }

    fn add_wall_tip(
        &mut self,
        vertex: VertexId,
        angle: u32,
        left: Option<SectorId>,
        right: Option<SectorId>,
    ) {
        let tips = &mut self.vertices[vertex].tips;
        let at = tips
            .binary_search_by_key(&angle, |tip| tip.angle)
            .unwrap_or_else(|insert_at| insert_at);
        tips.insert(at, WallTip { angle, left, right });
    }

    /// The sector occupying the angular gap at `vertex` in `direction`, or
    /// `None` if the direction runs along a wall or into the void.
    pub fn sector_toward(&self, vertex: VertexId, direction: Vec2d) -> Option<SectorId> {
        let tips = &self.vertices[vertex].tips;
        if tips.is_empty() {
            return None;
        }
        let angle = bams_atan2(direction[1], direction[0]);
        for tip in tips {
            if bams_distance(tip.angle, angle) <= ANGLE_EPSILON {
                return None;
            }
        }
        for tip in tips {
            if tip.angle > angle {
                return tip.right;
            }
        }
        tips[0].right
    }

    /// Split `id` (and its twin, if any) at `at`, keeping twin pairing
    /// consistent. The near fragments keep their ids; the far fragments are
    /// new edges.
    pub fn split_half_edge(&mut self, id: HalfEdgeId, at: Vec2d) -> SplitResult {
        self.num_splits += 1;
        let new_vertex = self.vertices.insert(Vertex {
            position: at,
            tips: Vec::new(),
        });

        let (end, linedef, source_linedef, sector, is_back, start_pos, end_pos) = {
            let hedge = &self.half_edges[id];
            (
                hedge.end,
                hedge.linedef,
                hedge.source_linedef,
                hedge.sector,
                hedge.is_back,
                hedge.geom.start,
                hedge.geom.end,
            )
        };

        let far = self.half_edges.insert(HalfEdge {
            start: new_vertex,
            end,
            twin: OptionId::none(),
            next: OptionId::none(),
            prev: OptionId::none(),
            linedef,
            source_linedef,
            sector,
            is_back,
            geom: EdgeGeom::new(at, end_pos),
        });
        {
            let hedge = &mut self.half_edges[id];
            hedge.end = new_vertex;
            hedge.geom = EdgeGeom::new(start_pos, at);
        }
        self.all_half_edges.push(far);
        if let Some(linedef) = linedef {
            self.linedef_half_edges[linedef as usize].push(far);
        } else {
            self.num_mini += 1;
        }

        let twin_sector = self.half_edges[id]
            .twin
            .into_option()
            .and_then(|twin| self.half_edges[twin].sector);
        let delta = end_pos - start_pos;
        self.add_wall_tip(
            new_vertex,
            bams_atan2(delta[1], delta[0]),
            twin_sector,
            sector,
        );
        self.add_wall_tip(
            new_vertex,
            bams_atan2(-delta[1], -delta[0]),
            sector,
            twin_sector,
        );

        let twin_far = if let Some(twin) = self.half_edges[id].twin.into_option() {
            let (twin_end, twin_linedef, twin_source, twin_sector, twin_back, twin_end_pos) = {
                let hedge = &self.half_edges[twin];
                (
                    hedge.end,
                    hedge.linedef,
                    hedge.source_linedef,
                    hedge.sector,
                    hedge.is_back,
                    hedge.geom.end,
                )
            };
            let twin_far = self.half_edges.insert(HalfEdge {
                start: new_vertex,
                end: twin_end,
                twin: OptionId::some(id),
                next: OptionId::none(),
                prev: OptionId::none(),
                linedef: twin_linedef,
                source_linedef: twin_source,
                sector: twin_sector,
                is_back: twin_back,
                geom: EdgeGeom::new(at, twin_end_pos),
            });
            {
                let hedge = &mut self.half_edges[twin];
                hedge.end = new_vertex;
                hedge.geom = EdgeGeom::new(hedge.geom.start, at);
                hedge.twin = OptionId::some(far);
            }
            self.half_edges[id].twin = OptionId::some(twin_far);
            self.half_edges[far].twin = OptionId::some(twin);
            self.all_half_edges.push(twin_far);
            if let Some(linedef) = twin_linedef {
                self.linedef_half_edges[linedef as usize].push(twin_far);
            } else {
                self.num_mini += 1;
            }
            Some(twin_far)
        } else {
            None
        };

        SplitResult {
            new_vertex,
            far,
            twin_far,
        }
    }

    /// Synthesise a twin pair of mini edges between two partition-line
    /// intersection vertices. The right edge runs `from -> to` (with the
    /// partition direction); the left edge is its twin.
    pub fn new_mini_pair(
        &mut self,
        from: VertexId,
        to: VertexId,
        right_sector: SectorId,
        left_sector: SectorId,
        source_linedef: Option<LinedefId>,
    ) -> (HalfEdgeId, HalfEdgeId) {
        let from_pos = self.vertices[from].position;
        let to_pos = self.vertices[to].position;
        let right = self.half_edges.insert(HalfEdge {
            start: from,
            end: to,
            twin: OptionId::none(),
            next: OptionId::none(),
            prev: OptionId::none(),
            linedef: None,
            source_linedef,
            sector: Some(right_sector),
            is_back: false,
            geom: EdgeGeom::new(from_pos, to_pos),
        });
        let left = self.half_edges.insert(HalfEdge {
            start: to,
            end: from,
            twin: OptionId::some(right),
            next: OptionId::none(),
            prev: OptionId::none(),
            linedef: None,
            source_linedef,
            sector: Some(left_sector),
            is_back: true,
            geom: EdgeGeom::new(to_pos, from_pos),
        });
        self.half_edges[right].twin = OptionId::some(left);
        self.all_half_edges.push(right);
        self.all_half_edges.push(left);
        self.num_mini += 2;
        (right, left)
    }

    /// Link `hedges` into a closed `next`/`prev` cycle, in the given order.
    pub fn link_ring(&mut self, hedges: &[HalfEdgeId]) {
        let count = hedges.len();
        for (index, &id) in hedges.iter().enumerate() {
            let next = hedges[(index + 1) % count];
            let prev = hedges[(index + count - 1) % count];
            let hedge = &mut self.half_edges[id];
            hedge.next = OptionId::some(next);
            hedge.prev = OptionId::some(prev);
        }
    }
}

/// The "one-sided window" compatibility heuristic: a one-sided line whose
/// endpoints both have an odd number of one-sided lines attached may really
/// be a see-through window in disguise. A horizontal or vertical ray cast
/// from the line's midpoint finds the sector behind it; that sector then
/// acts as the line's back for partitioning only.
fn detect_window_effects(geometry: &Geometry) -> VecMap<SectorId> {
    let mut one_sided_at_vertex = vec![0_usize; geometry.vertices.len()];
    for linedef in &geometry.linedefs {
        if linedef.has_front_side() && !linedef.has_back_side() && !linedef.polyobj {
            one_sided_at_vertex[linedef.start_vertex as usize] += 1;
            one_sided_at_vertex[linedef.end_vertex as usize] += 1;
        }
    }

    let mut windows = VecMap::new();
    for (index, linedef) in geometry.linedefs.iter().enumerate() {
        if !linedef.has_front_side() || linedef.has_back_side() || linedef.polyobj {
            continue;
        }
        if one_sided_at_vertex[linedef.start_vertex as usize] % 2 != 1
            || one_sided_at_vertex[linedef.end_vertex as usize] % 2 != 1
        {
            continue;
        }
        if let Some(sector) = test_for_window_effect(geometry, index) {
            debug!(
                "Window effect: linedef {} gets partition-side back sector {}",
                index, sector
            );
            windows.insert(index, sector);
        }
    }
    windows
}

fn test_for_window_effect(geometry: &Geometry, index: usize) -> Option<SectorId> {
    let linedef = &geometry.linedefs[index];
    let (start, end) = geometry.linedef_vertices(linedef)?;
    let front_sector = geometry.front_sector_id(linedef)?;
    let mid = (start + end) * 0.5;
    let delta = end - start;
    let cast_horizontal = delta[0].abs() < delta[1].abs();

    let mut front_hit: Option<(f64, Option<SectorId>)> = None;
    let mut back_hit: Option<(f64, Option<SectorId>)> = None;

    for (other_index, other) in geometry.linedefs.iter().enumerate() {
        if other_index == index || other.polyobj {
            continue;
        }
        let other_front = geometry.front_sector_id(other);
        let other_back = geometry.back_sector_id(other);
        if other_front.is_some() && other_front == other_back {
            // Self-referencing lines never make good window backings.
            continue;
        }
        let (other_start, other_end) = match geometry.linedef_vertices(other) {
            Some(points) => points,
            None => continue,
        };
        let other_delta = other_end - other_start;

        let (dist, facing_right) = if cast_horizontal {
            if other_delta[1].abs() < DIST_EPSILON {
                continue;
            }
            if other_start[1].max(other_end[1]) < mid[1] - DIST_EPSILON
                || other_start[1].min(other_end[1]) > mid[1] + DIST_EPSILON
            {
                continue;
            }
            let hit_x = other_start[0] + (mid[1] - other_start[1]) * other_delta[0] / other_delta[1];
            let dist = hit_x - mid[0];
            (dist, (dist > 0.0) == (other_delta[1] < 0.0))
        } else {
            if other_delta[0].abs() < DIST_EPSILON {
                continue;
            }
            if other_start[0].max(other_end[0]) < mid[0] - DIST_EPSILON
                || other_start[0].min(other_end[0]) > mid[0] + DIST_EPSILON
            {
                continue;
            }
            let hit_y = other_start[1] + (mid[0] - other_start[0]) * other_delta[1] / other_delta[0];
            let dist = hit_y - mid[1];
            (dist, (dist > 0.0) == (other_delta[0] > 0.0))
        };
        if dist.abs() < DIST_EPSILON {
            continue;
        }

        let hit_on_front = if cast_horizontal {
            (dist > 0.0) == (delta[1] > 0.0)
        } else {
            (dist > 0.0) == (delta[0] < 0.0)
        };
        let sector = if facing_right { other_front } else { other_back };
        let slot = if hit_on_front {
            &mut front_hit
        } else {
            &mut back_hit
        };
        match slot {
            Some((nearest, _)) if dist.abs() >= *nearest => {}
            _ => *slot = Some((dist.abs(), sector)),
        }
    }

    let (_, front_open) = front_hit?;
    let (_, back_open) = back_hit?;
    if front_open == Some(front_sector) {
        back_open
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::Mesh;
    use crate::test_support::GeometryBuilder;
    use math::Vec2d;

    #[test]
    fn square_room_has_four_buildable_half_edges() {
        let mut builder = GeometryBuilder::new();
        let sector = builder.add_sector();
        builder.ring(sector, &[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]);
        let geometry = builder.build();
        let mesh = Mesh::from_geometry(&geometry);

        assert_eq!(mesh.num_half_edges(), 8);
        assert_eq!(mesh.buildable_half_edges().len(), 4);
        for &id in mesh.half_edge_ids() {
            let hedge = mesh.half_edge(id);
            let twin = hedge.twin.into_option().expect("missing twin");
            assert_eq!(mesh.half_edge(twin).twin.into_option(), Some(id));
        }
    }

    #[test]
    fn sector_toward_looks_into_the_room() {
        let mut builder = GeometryBuilder::new();
        let sector = builder.add_sector();
        builder.ring(sector, &[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]);
        let geometry = builder.build();
        let mesh = Mesh::from_geometry(&geometry);

        let corner = mesh
            .half_edge_ids()
            .iter()
            .map(|&id| mesh.half_edge(id).start)
            .find(|&vertex| mesh.position(vertex) == Vec2d::new(0.0, 0.0))
            .unwrap();
        assert_eq!(mesh.sector_toward(corner, Vec2d::new(1.0, 1.0)), Some(sector));
        assert_eq!(mesh.sector_toward(corner, Vec2d::new(-1.0, -1.0)), None);
        // Along the wall itself there is no open sector.
        assert_eq!(mesh.sector_toward(corner, Vec2d::new(0.0, 1.0)), None);
    }

    #[test]
    fn split_preserves_twin_pairing_and_linedef_backrefs() {
        let mut builder = GeometryBuilder::new();
        let sector = builder.add_sector();
        builder.ring(sector, &[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]);
        let geometry = builder.build();
        let mut mesh = Mesh::from_geometry(&geometry);

        let target = mesh
            .half_edge_ids()
            .iter()
            .cloned()
            .find(|&id| {
                let hedge = mesh.half_edge(id);
                !hedge.is_back && mesh.position(hedge.start) == Vec2d::new(0.0, 0.0)
            })
            .unwrap();
        let linedef = mesh.half_edge(target).linedef.unwrap();
        let split = mesh.split_half_edge(target, Vec2d::new(0.0, 2.0));

        assert_eq!(mesh.position(split.new_vertex), Vec2d::new(0.0, 2.0));
        assert_eq!(mesh.half_edge(target).end, split.new_vertex);
        assert_eq!(mesh.half_edge(split.far).start, split.new_vertex);
        assert_eq!(mesh.linedef_half_edges(linedef).len(), 4);
        for &id in mesh.half_edge_ids() {
            let hedge = mesh.half_edge(id);
            let twin = hedge.twin.into_option().expect("missing twin");
            assert_eq!(mesh.half_edge(twin).twin.into_option(), Some(id));
            assert_eq!(mesh.half_edge(twin).start, hedge.end);
            assert_eq!(mesh.half_edge(twin).end, hedge.start);
        }
    }

    #[test]
    fn lone_line_in_room_gets_window_back_sector() {
        let mut builder = GeometryBuilder::new();
        let sector = builder.add_sector();
        builder.ring(sector, &[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]);
        // A lone one-sided wall inside the room; both endpoints have exactly
        // one one-sided line attached.
        builder.one_sided(sector, (2.0, 1.0), (2.0, 3.0));
        let geometry = builder.build();
        let mesh = Mesh::from_geometry(&geometry);

        // The gameplay-visible data is unchanged...
        assert!(!geometry.linedefs[4].has_back_side());
        // ...but the partition-facing back half-edge got the room's sector.
        let back = mesh
            .half_edge_ids()
            .iter()
            .cloned()
            .find(|&id| {
                let hedge = mesh.half_edge(id);
                hedge.is_back && hedge.linedef == Some(4)
            })
            .unwrap();
        assert_eq!(mesh.half_edge(back).sector, Some(sector));
        assert_eq!(mesh.buildable_half_edges().len(), 6);
    }
}
