use crate::subsector::{Subsector, SubsectorId};
use math::{Aabb, Line2d, Vec2d};

/// An interior node: the partition line and the two child spaces. The right
/// child covers the positive side of the partition.
pub struct InternalNode {
    pub partition: Line2d,
    pub right_bounds: Aabb,
    pub left_bounds: Aabb,
    pub right: BspNode,
    pub left: BspNode,
}

pub enum BspNode {
    Internal(Box<InternalNode>),
    Leaf(SubsectorId),
}

/// The finished spatial index: a strict binary tree over the map whose
/// leaves are convex subsectors.
pub struct BspTree {
    root: BspNode,
    subsectors: Vec<Subsector>,
}

impl BspTree {
    pub(crate) fn new(root: BspNode, subsectors: Vec<Subsector>) -> BspTree {
        BspTree { root, subsectors }
    }

    pub fn root(&self) -> &BspNode {
        &self.root
    }

    pub fn subsectors(&self) -> &[Subsector] {
        &self.subsectors
    }

    pub fn subsector(&self, id: SubsectorId) -> &Subsector {
        &self.subsectors[id]
    }

    /// The subsector containing `point`. Points on a partition line resolve
    /// to the right child, matching how half-edges were distributed.
    pub fn locate(&self, point: Vec2d) -> &Subsector {
        let mut node = &self.root;
        loop {
            match node {
                BspNode::Leaf(id) => return &self.subsectors[*id],
                BspNode::Internal(internal) => {
                    node = if internal.partition.signed_distance(&point) >= 0.0 {
                        &internal.right
                    } else {
                        &internal.left
                    };
                }
            }
        }
    }

    /// Visit subsectors in depth order relative to `eye`: nearest first when
    /// `front_to_back`, farthest first otherwise. The visitor returns `false`
    /// to stop the walk early; the return value reports whether the walk ran
    /// to completion.
    pub fn walk_ordered<Visit>(&self, eye: Vec2d, front_to_back: bool, visit: &mut Visit) -> bool
    where
        Visit: FnMut(&Subsector) -> bool,
    {
        self.walk_node(&self.root, eye, front_to_back, visit)
    }

    fn walk_node<Visit>(
        &self,
        node: &BspNode,
        eye: Vec2d,
        front_to_back: bool,
        visit: &mut Visit,
    ) -> bool
    where
        Visit: FnMut(&Subsector) -> bool,
    {
        match node {
            BspNode::Leaf(id) => visit(&self.subsectors[*id]),
            BspNode::Internal(internal) => {
                let eye_on_right = internal.partition.signed_distance(&eye) >= 0.0;
                let (near, far) = if eye_on_right {
                    (&internal.right, &internal.left)
                } else {
                    (&internal.left, &internal.right)
                };
                let (first, second) = if front_to_back { (near, far) } else { (far, near) };
                self.walk_node(first, eye, front_to_back, visit)
                    && self.walk_node(second, eye, front_to_back, visit)
            }
        }
    }

    pub fn height(&self) -> usize {
        fn depth(node: &BspNode) -> usize {
            match node {
                BspNode::Leaf(_) => 1,
                BspNode::Internal(internal) => {
                    1 + depth(&internal.right).max(depth(&internal.left))
                }
            }
        }
        depth(&self.root)
    }

    pub fn num_nodes(&self) -> usize {
        fn count(node: &BspNode) -> usize {
            match node {
                BspNode::Leaf(_) => 0,
                BspNode::Internal(internal) => {
                    1 + count(&internal.right) + count(&internal.left)
                }
            }
        }
        count(&self.root)
    }
}
