use crate::cut_list::CutList;
use crate::errors::{ErrorKind, Result};
use crate::mesh::{EdgeGeom, HalfEdgeId, Mesh};
use crate::subsector::{Subsector, SubsectorId};
use crate::superblock::{SuperBlockId, SuperBlocks};
use crate::tree::{BspNode, BspTree, InternalNode};
use crate::{Config, DIST_EPSILON};
use failchain::bail;
use log::{debug, warn};
use map::LinedefId;
use math::{Aabb, Line2d, Vec2d, Vector};
use std::collections::{HashMap, HashSet};

/// Counters accumulated over one build, logged by the crate entry point.
#[derive(Copy, Clone, Debug, Default)]
pub struct BuildStats {
    pub num_nodes: usize,
    pub num_subsectors: usize,
    pub num_splits: usize,
    pub num_mini_half_edges: usize,
    pub num_vertices: usize,
    pub num_half_edges: usize,
}

/// The partition line of one node, taken from a real half-edge. The line
/// keeps the half-edge's direction, so "right of the partition" and "right
/// of the half-edge" agree.
struct Partition {
    line: Line2d,
    source_linedef: Option<LinedefId>,
}

/// Where a half-edge currently lives. Splitting one half-edge also splits
/// its twin, and the twin may sit anywhere in the build: still filed under
/// a superblock awaiting its own partition pass, or already drained into a
/// subsector. The far fragment of the twin has to land in the same place.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Home {
    Block(SuperBlockId),
    Subsector(SubsectorId),
}

#[derive(Default)]
struct EvalCounts {
    splits: usize,
    real_left: usize,
    real_right: usize,
    mini_left: usize,
    mini_right: usize,
}

/// Recursive BSP builder over a half-edge mesh. Consumes superblocks as it
/// partitions, growing the mesh with split fragments and mini edges, and
/// leaves behind the node tree and the leaf subsectors.
pub struct NodeBuilder<'a> {
    mesh: &'a mut Mesh,
    config: &'a Config,
    blocks: SuperBlocks,
    cuts: CutList,
    subsectors: Vec<Subsector>,
    homes: HashMap<HalfEdgeId, Home>,
    num_nodes: usize,
}

impl<'a> NodeBuilder<'a> {
    pub fn new(mesh: &'a mut Mesh, config: &'a Config) -> NodeBuilder<'a> {
        NodeBuilder {
            mesh,
            config,
            blocks: SuperBlocks::new(),
            cuts: CutList::new(),
            subsectors: Vec::new(),
            homes: HashMap::new(),
            num_nodes: 0,
        }
    }

    /// File a half-edge under a region's superblock and remember where it
    /// went, so a later split of its twin can find it.
    fn file(&mut self, root: SuperBlockId, id: HalfEdgeId) {
        self.blocks.add_half_edge(root, self.mesh, id);
        self.homes.insert(id, Home::Block(root));
    }

    pub fn build(mut self) -> Result<(BspTree, BuildStats)> {
        let buildable = self.mesh.buildable_half_edges();
        if buildable.is_empty() {
            bail!(ErrorKind::EmptyMap);
        }

        let mut bounds = Aabb::from_point(self.mesh.half_edge(buildable[0]).geom.start);
        for &id in &buildable {
            let geom = &self.mesh.half_edge(id).geom;
            bounds.include(geom.start);
            bounds.include(geom.end);
        }
        let root = self.blocks.create_root(&bounds);
        for &id in &buildable {
            self.file(root, id);
        }

        let (root_node, _) = self.build_nodes(root)?;

        let mut warned_pairs = HashSet::new();
        for (index, subsector) in self.subsectors.iter_mut().enumerate() {
            subsector.finish(self.mesh, index, &mut warned_pairs);
        }

        let stats = BuildStats {
            num_nodes: self.num_nodes,
            num_subsectors: self.subsectors.len(),
            num_splits: self.mesh.num_splits(),
            num_mini_half_edges: self.mesh.num_mini_half_edges(),
            num_vertices: self.mesh.num_vertices(),
            num_half_edges: self.mesh.num_half_edges(),
        };
        Ok((BspTree::new(root_node, self.subsectors), stats))
    }

    /// Recursively partition `block` until no valid partition remains, at
    /// which point the block's half-edges close into one convex subsector.
    fn build_nodes(&mut self, block: SuperBlockId) -> Result<(BspNode, Aabb)> {
        let partition = match self.pick_partition(block) {
            Some(partition) => partition,
            None => {
                let index = self.create_subsector(block);
                let bounds = self.subsectors[index].bounds;
                return Ok((BspNode::Leaf(index), bounds));
            }
        };

        let block_bounds = self.blocks.block(block).bounds;
        let right = self.blocks.create_root_with(block_bounds);
        let left = self.blocks.create_root_with(block_bounds);
        self.partition_half_edges(&partition, block, right, left);
        self.add_mini_half_edges(&partition, right, left);

        // A valid partition leaves both sides populated; if stitching ever
        // fails to uphold that, fold the degenerate side away.
        if self.blocks.block(right).total() == 0 {
            warn!("Partition produced an empty right side; collapsing node");
            self.blocks.destroy(right);
            return self.build_nodes(left);
        }
        if self.blocks.block(left).total() == 0 {
            warn!("Partition produced an empty left side; collapsing node");
            self.blocks.destroy(left);
            return self.build_nodes(right);
        }

        self.num_nodes += 1;
        let (right_node, right_bounds) = self.build_nodes(right)?;
        let (left_node, left_bounds) = self.build_nodes(left)?;
        let bounds = right_bounds.union(&left_bounds);
        Ok((
            BspNode::Internal(Box::new(InternalNode {
                partition: partition.line,
                right_bounds,
                left_bounds,
                right: right_node,
                left: left_node,
            })),
            bounds,
        ))
    }

    fn create_subsector(&mut self, block: SuperBlockId) -> usize {
        let mut hedges = Vec::new();
        self.blocks.take_all(block, &mut hedges);
        let index = self.subsectors.len();
        for &id in &hedges {
            self.homes.insert(id, Home::Subsector(index));
        }
        self.subsectors.push(Subsector::new(self.mesh, hedges));
        index
    }

    /// Try every real half-edge in the block as a partition candidate and
    /// keep the cheapest valid one. Ties keep the earliest candidate in
    /// traversal order, which makes builds deterministic.
    fn pick_partition(&self, root: SuperBlockId) -> Option<Partition> {
        let mut best: Option<(i64, Partition)> = None;
        let mut stack = vec![root];
        while let Some(block_id) = stack.pop() {
            let block = self.blocks.block(block_id);
            for &id in block.half_edges() {
                let hedge = self.mesh.half_edge(id);
                if hedge.is_mini() {
                    continue;
                }
                let line = hedge.geom.line;
                let best_cost = best.as_ref().map(|&(cost, _)| cost);
                if let Some(cost) = self.eval_partition(root, &line, best_cost) {
                    best = Some((
                        cost,
                        Partition {
                            line,
                            source_linedef: hedge.source_linedef,
                        },
                    ));
                }
            }
            for index in (0..2).rev() {
                if let Some(child) = block.child(index) {
                    stack.push(child);
                }
            }
        }
        best.map(|(_, partition)| partition)
    }

    /// Cost of partitioning along `line`, or `None` if the partition is
    /// invalid (a side without real half-edges) or already costlier than
    /// `best_cost`. Splits dominate; the balance terms break ties between
    /// split-free candidates.
    fn eval_partition(
        &self,
        root: SuperBlockId,
        line: &Line2d,
        best_cost: Option<i64>,
    ) -> Option<i64> {
        let mut counts = EvalCounts::default();
        if !self.eval_worker(root, line, best_cost, &mut counts) {
            return None;
        }
        if counts.real_left == 0 || counts.real_right == 0 {
            return None;
        }
        let split_factor = i64::from(self.config.split_factor);
        let real_diff = (counts.real_left as i64 - counts.real_right as i64).abs();
        let mini_diff = (counts.mini_left as i64 - counts.mini_right as i64).abs();
        let cost = counts.splits as i64 * 100 * split_factor + real_diff * 20 + mini_diff * 2;
        match best_cost {
            Some(best) if cost >= best => None,
            _ => Some(cost),
        }
    }

    fn eval_worker(
        &self,
        block_id: SuperBlockId,
        line: &Line2d,
        best_cost: Option<i64>,
        counts: &mut EvalCounts,
    ) -> bool {
        let block = self.blocks.block(block_id);

        // Whole blocks strictly on one side contribute their counts without
        // visiting any half-edge in them.
        let mut all_right = true;
        let mut all_left = true;
        for corner in &block.bounds.corners() {
            let distance = line.signed_distance(corner);
            if distance <= DIST_EPSILON {
                all_right = false;
            }
            if distance >= -DIST_EPSILON {
                all_left = false;
            }
        }
        if all_right {
            counts.real_right += block.num_real();
            counts.mini_right += block.num_mini();
            return true;
        }
        if all_left {
            counts.real_left += block.num_real();
            counts.mini_left += block.num_mini();
            return true;
        }

        for &id in block.half_edges() {
            let hedge = self.mesh.half_edge(id);
            let real = !hedge.is_mini();
            let a = line.signed_distance(&hedge.geom.start);
            let b = line.signed_distance(&hedge.geom.end);

            if a.abs() <= DIST_EPSILON && b.abs() <= DIST_EPSILON {
                if hedge.geom.delta.dot(&line.displace) > 0.0 {
                    if real {
                        counts.real_right += 1;
                    } else {
                        counts.mini_right += 1;
                    }
                } else if real {
                    counts.real_left += 1;
                } else {
                    counts.mini_left += 1;
                }
            } else if a >= -DIST_EPSILON && b >= -DIST_EPSILON {
                if real {
                    counts.real_right += 1;
                } else {
                    counts.mini_right += 1;
                }
            } else if a <= DIST_EPSILON && b <= DIST_EPSILON {
                if real {
                    counts.real_left += 1;
                } else {
                    counts.mini_left += 1;
                }
            } else {
                counts.splits += 1;
                if real {
                    counts.real_left += 1;
                    counts.real_right += 1;
                } else {
                    counts.mini_left += 1;
                    counts.mini_right += 1;
                }
                if let Some(best) = best_cost {
                    let split_factor = i64::from(self.config.split_factor);
                    if counts.splits as i64 * 100 * split_factor >= best {
                        return false;
                    }
                }
            }
        }

        for index in 0..2 {
            if let Some(child) = block.child(index) {
                if !self.eval_worker(child, line, best_cost, counts) {
                    return false;
                }
            }
        }
        true
    }

    /// Distribute every half-edge of `parent` to the `right`/`left` child
    /// blocks, splitting straddlers and recording every touch of the
    /// partition line in the cut list.
    fn partition_half_edges(
        &mut self,
        partition: &Partition,
        parent: SuperBlockId,
        right: SuperBlockId,
        left: SuperBlockId,
    ) {
        let mut queue = Vec::new();
        self.blocks.take_all(parent, &mut queue);
        let mut pending: HashSet<HalfEdgeId> = queue.iter().cloned().collect();

        let mut cursor = 0;
        while cursor < queue.len() {
            let id = queue[cursor];
            cursor += 1;
            pending.remove(&id);

            let (geom, start, end) = {
                let hedge = self.mesh.half_edge(id);
                (hedge.geom, hedge.start, hedge.end)
            };
            let a = partition.line.signed_distance(&geom.start);
            let b = partition.line.signed_distance(&geom.end);

            if a.abs() <= DIST_EPSILON && b.abs() <= DIST_EPSILON {
                // Collinear with the partition: both endpoints touch it, and
                // the edge goes to the side its own sector faces.
                self.cuts.add(start, partition.line.offset_of(&geom.start));
                self.cuts.add(end, partition.line.offset_of(&geom.end));
                let side = if geom.delta.dot(&partition.line.displace) > 0.0 {
                    right
                } else {
                    left
                };
                self.file(side, id);
            } else if a >= -DIST_EPSILON && b >= -DIST_EPSILON {
                if a.abs() <= DIST_EPSILON {
                    self.cuts.add(start, partition.line.offset_of(&geom.start));
                }
                if b.abs() <= DIST_EPSILON {
                    self.cuts.add(end, partition.line.offset_of(&geom.end));
                }
                self.file(right, id);
            } else if a <= DIST_EPSILON && b <= DIST_EPSILON {
                if a.abs() <= DIST_EPSILON {
                    self.cuts.add(start, partition.line.offset_of(&geom.start));
                }
                if b.abs() <= DIST_EPSILON {
                    self.cuts.add(end, partition.line.offset_of(&geom.end));
                }
                self.file(left, id);
            } else {
                let at = intersection_point(&geom, &partition.line, a, b);
                let split = self.mesh.split_half_edge(id, at);
                self.cuts
                    .add(split.new_vertex, partition.line.offset_of(&at));

                let (near_side, far_side) = if a > 0.0 { (right, left) } else { (left, right) };
                self.file(near_side, id);
                self.file(far_side, split.far);

                // The twin was split along with us. If it is still waiting
                // in this pass's queue, its far fragment needs classifying
                // too. Otherwise the twin lives on the other side of an
                // earlier partition (a collinear pass sends twins to
                // opposite sides) and the fragment must follow it there, or
                // the ring it closes loses geometry. A twin with no home
                // bounds the void and stays out.
                if let Some(twin_far) = split.twin_far {
                    let twin = self
                        .mesh
                        .half_edge(split.far)
                        .twin
                        .into_option()
                        .expect("split hedge lost its twin");
                    if pending.contains(&twin) {
                        pending.insert(twin_far);
                        queue.push(twin_far);
                    } else {
                        match self.homes.get(&twin).copied() {
                            Some(Home::Block(home)) => self.file(home, twin_far),
                            Some(Home::Subsector(subsector)) => {
                                self.subsectors[subsector].hedges.push(twin_far);
                                self.homes.insert(twin_far, Home::Subsector(subsector));
                            }
                            None => {}
                        }
                    }
                }
            }
        }
    }

    /// Close the gaps the partition line opens through sector interiors with
    /// twin pairs of mini edges, so both child spaces stay watertight.
    fn add_mini_half_edges(&mut self, partition: &Partition, right: SuperBlockId, left: SuperBlockId) {
        self.cuts.merge();
        let points = self.cuts.take_points();
        let direction = partition.line.displace;

        for pair in points.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            let after = self.mesh.sector_toward(current.vertex, direction);
            let before = self.mesh.sector_toward(next.vertex, -direction);
            match (after, before) {
                (Some(after_sector), Some(before_sector)) => {
                    if after_sector != before_sector {
                        warn!(
                            "Partition gap bounded by sectors {} and {}",
                            after_sector, before_sector
                        );
                    }
                    let (right_mini, left_mini) = self.mesh.new_mini_pair(
                        current.vertex,
                        next.vertex,
                        after_sector,
                        before_sector,
                        partition.source_linedef,
                    );
                    self.file(right, right_mini);
                    self.file(left, left_mini);
                }
                (None, None) => {}
                (after, before) => {
                    debug!(
                        "One-sided partition gap (after: {:?}, before: {:?}); skipped",
                        after, before
                    );
                }
            }
        }
    }
}

/// Intersection of a straddling half-edge with the partition line, with the
/// axis-aligned coordinates pinned exactly to avoid drift.
fn intersection_point(geom: &EdgeGeom, partition: &Line2d, a: f64, b: f64) -> Vec2d {
    let along = a / (a - b);
    let mut point = Vec2d::new(
        if geom.delta[0] == 0.0 {
            geom.start[0]
        } else {
            geom.start[0] + along * geom.delta[0]
        },
        if geom.delta[1] == 0.0 {
            geom.start[1]
        } else {
            geom.start[1] + along * geom.delta[1]
        },
    );
    if partition.displace[0] == 0.0 {
        point[0] = partition.origin[0];
    }
    if partition.displace[1] == 0.0 {
        point[1] = partition.origin[1];
    }
    point
}
