use crate::mesh::VertexId;
use crate::DIST_EPSILON;
use log::debug;

/// An intersection of the current partition line with an edge (or edge
/// endpoint), keyed by the distance along the partition direction.
#[derive(Copy, Clone, Debug)]
pub struct Intersection {
    pub vertex: VertexId,
    pub along: f64,
}

/// Collects the intersection points of one `partition_half_edges` pass.
/// Near-duplicate points are coalesced before gap stitching so that no
/// zero-length mini edge can be synthesised. Reset after every pass.
pub struct CutList {
    points: Vec<Intersection>,
}

impl CutList {
    pub fn new() -> CutList {
        CutList { points: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Record an intersection. A vertex already on the list is recorded
    /// once only; twins share vertices so both sides land on one entry.
    pub fn add(&mut self, vertex: VertexId, along: f64) {
        if self.points.iter().any(|point| point.vertex == vertex) {
            return;
        }
        self.points.push(Intersection { vertex, along });
    }

    /// Sort by distance along the partition and collapse entries closer
    /// than twice the distance epsilon.
    pub fn merge(&mut self) {
        self.points
            .sort_by(|a, b| a.along.partial_cmp(&b.along).expect("NaN cut distance"));
        let before = self.points.len();
        let mut kept: Vec<Intersection> = Vec::with_capacity(before);
        for point in self.points.drain(..) {
            match kept.last() {
                Some(last) if point.along - last.along <= 2.0 * DIST_EPSILON => {}
                _ => kept.push(point),
            }
        }
        if kept.len() != before {
            debug!(
                "Merged {} near-duplicate cut points down to {}",
                before,
                kept.len()
            );
        }
        self.points = kept;
    }

    /// Drain the merged points, leaving the list empty for the next pass.
    pub fn take_points(&mut self) -> Vec<Intersection> {
        std::mem::replace(&mut self.points, Vec::new())
    }
}
