use crate::mesh::{HalfEdgeId, Mesh};
use idcontain::{Id, IdSlab, OptionId};
use log::debug;
use math::{Aabb, Vec2d};

pub type SuperBlockId = Id<SuperBlock>;

/// Blocks stop subdividing at this size, bounding tree depth regardless of
/// how many edges pile up in one place.
const LEAF_SIZE: i32 = 256;

/// Integer block bounds; superblocks live on a coarse world-unit grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockBounds {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BlockBounds {
    fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    fn is_leaf(&self) -> bool {
        self.width() <= LEAF_SIZE && self.height() <= LEAF_SIZE
    }

    pub fn corners(&self) -> [Vec2d; 4] {
        [
            Vec2d::new(f64::from(self.x1), f64::from(self.y1)),
            Vec2d::new(f64::from(self.x2), f64::from(self.y1)),
            Vec2d::new(f64::from(self.x2), f64::from(self.y2)),
            Vec2d::new(f64::from(self.x1), f64::from(self.y2)),
        ]
    }
}

/// One node of the build-time quad-tree over half-edges. Edges that
/// straddle the split midline stay on the node itself; everything else
/// filters down into the (lazily created) child halves.
pub struct SuperBlock {
    pub bounds: BlockBounds,
    children: [OptionId<SuperBlock>; 2],
    half_edges: Vec<HalfEdgeId>,
    num_real: usize,
    num_mini: usize,
}

impl SuperBlock {
    fn new(bounds: BlockBounds) -> SuperBlock {
        SuperBlock {
            bounds,
            children: [OptionId::none(), OptionId::none()],
            half_edges: Vec::new(),
            num_real: 0,
            num_mini: 0,
        }
    }

    pub fn half_edges(&self) -> &[HalfEdgeId] {
        &self.half_edges
    }

    pub fn child(&self, index: usize) -> Option<SuperBlockId> {
        self.children[index].into_option()
    }

    /// Counts cover the whole subtree, not just this node's own list.
    pub fn num_real(&self) -> usize {
        self.num_real
    }

    pub fn num_mini(&self) -> usize {
        self.num_mini
    }

    pub fn total(&self) -> usize {
        self.num_real + self.num_mini
    }
}

/// The arena all superblocks live in. Freed blocks go back to the slab's
/// internal free list, so the thousands of blocks churned through during a
/// build recycle a small set of slots.
pub struct SuperBlocks {
    slab: IdSlab<SuperBlock>,
}

impl SuperBlocks {
    pub fn new() -> SuperBlocks {
        SuperBlocks {
            slab: IdSlab::with_capacity(256),
        }
    }

    pub fn block(&self, id: SuperBlockId) -> &SuperBlock {
        &self.slab[id]
    }

    /// Root block sized to cover `bounds`: rounded out to integers and
    /// squared up so splits alternate cleanly.
    pub fn create_root(&mut self, bounds: &Aabb) -> SuperBlockId {
        let x1 = bounds.min[0].floor() as i32;
        let y1 = bounds.min[1].floor() as i32;
        let width = (bounds.max[0].ceil() as i32 - x1).max(1);
        let height = (bounds.max[1].ceil() as i32 - y1).max(1);
        let side = (width.max(height).max(LEAF_SIZE) as u32).next_power_of_two() as i32;
        self.create_root_with(BlockBounds {
            x1,
            y1,
            x2: x1 + side,
            y2: y1 + side,
        })
    }

    pub fn create_root_with(&mut self, bounds: BlockBounds) -> SuperBlockId {
        self.slab.insert(SuperBlock::new(bounds))
    }

    /// File a half-edge under `root`, descending into whichever half holds
    /// both endpoints and splitting along the longer axis.
    pub fn add_half_edge(&mut self, root: SuperBlockId, mesh: &Mesh, id: HalfEdgeId) {
        let (start, end, is_mini) = {
            let hedge = mesh.half_edge(id);
            (hedge.geom.start, hedge.geom.end, hedge.is_mini())
        };

        let mut current = root;
        loop {
            let (bounds, is_leaf) = {
                let block = &mut self.slab[current];
                if is_mini {
                    block.num_mini += 1;
                } else {
                    block.num_real += 1;
                }
                (block.bounds, block.bounds.is_leaf())
            };
            if is_leaf {
                self.slab[current].half_edges.push(id);
                return;
            }

            let horizontal = bounds.width() >= bounds.height();
            let (child_index, child_bounds) = if horizontal {
                let mid = bounds.x1 + bounds.width() / 2;
                let in_high = (start[0] >= f64::from(mid), end[0] >= f64::from(mid));
                match in_high {
                    (true, true) => (
                        1,
                        BlockBounds {
                            x1: mid,
                            ..bounds
                        },
                    ),
                    (false, false) => (
                        0,
                        BlockBounds {
                            x2: mid,
                            ..bounds
                        },
                    ),
                    _ => {
                        self.slab[current].half_edges.push(id);
                        return;
                    }
                }
            } else {
                let mid = bounds.y1 + bounds.height() / 2;
                let in_high = (start[1] >= f64::from(mid), end[1] >= f64::from(mid));
                match in_high {
                    (true, true) => (
                        1,
                        BlockBounds {
                            y1: mid,
                            ..bounds
                        },
                    ),
                    (false, false) => (
                        0,
                        BlockBounds {
                            y2: mid,
                            ..bounds
                        },
                    ),
                    _ => {
                        self.slab[current].half_edges.push(id);
                        return;
                    }
                }
            };

            current = match self.slab[current].children[child_index].into_option() {
                Some(child) => child,
                None => {
                    let child = self.slab.insert(SuperBlock::new(child_bounds));
                    self.slab[current].children[child_index] = OptionId::some(child);
                    child
                }
            };
        }
    }

    /// Drain every half-edge out of `id`'s subtree into `out`, recycling
    /// the emptied blocks.
    pub fn take_all(&mut self, id: SuperBlockId, out: &mut Vec<HalfEdgeId>) {
        let mut block = self.slab.remove(id).expect("missing superblock");
        out.append(&mut block.half_edges);
        for child in &block.children {
            if let Some(child) = child.into_option() {
                self.take_all(child, out);
            }
        }
    }

    /// Recycle a subtree without caring about its contents.
    pub fn destroy(&mut self, id: SuperBlockId) {
        let block = self.slab.remove(id).expect("missing superblock");
        if !block.half_edges.is_empty() {
            debug!(
                "Destroying superblock holding {} half-edges",
                block.half_edges.len()
            );
        }
        for child in &block.children {
            if let Some(child) = child.into_option() {
                self.destroy(child);
            }
        }
    }

    pub fn num_blocks(&self) -> usize {
        self.slab.len()
    }
}

#[cfg(test)]
mod test {
    use super::SuperBlocks;
    use crate::mesh::Mesh;
    use crate::test_support::GeometryBuilder;
    use math::Aabb;
    use math::Vec2d;

    fn big_room() -> Mesh {
        let mut builder = GeometryBuilder::new();
        let sector = builder.add_sector();
        builder.ring(
            sector,
            &[(0.0, 0.0), (0.0, 2048.0), (2048.0, 2048.0), (2048.0, 0.0)],
        );
        Mesh::from_geometry(&builder.build())
    }

    #[test]
    fn counts_cover_the_subtree() {
        let mesh = big_room();
        let mut blocks = SuperBlocks::new();
        let root = blocks.create_root(&Aabb {
            min: Vec2d::new(0.0, 0.0),
            max: Vec2d::new(2048.0, 2048.0),
        });
        for id in mesh.buildable_half_edges() {
            blocks.add_half_edge(root, &mesh, id);
        }
        assert_eq!(blocks.block(root).num_real(), 4);
        assert_eq!(blocks.block(root).num_mini(), 0);
    }

    #[test]
    fn take_all_drains_and_recycles() {
        let mesh = big_room();
        let mut blocks = SuperBlocks::new();
        let root = blocks.create_root(&Aabb {
            min: Vec2d::new(0.0, 0.0),
            max: Vec2d::new(2048.0, 2048.0),
        });
        for id in mesh.buildable_half_edges() {
            blocks.add_half_edge(root, &mesh, id);
        }
        let mut drained = Vec::new();
        blocks.take_all(root, &mut drained);
        assert_eq!(drained.len(), 4);
        assert_eq!(blocks.num_blocks(), 0);
    }
}
