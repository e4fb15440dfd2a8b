//! Binary space partitioning over level geometry.
//!
//! The entry point is [`build`]: it lifts a validated [`map::Geometry`] into
//! a half-edge [`Mesh`], recursively partitions it into convex subsectors
//! and returns the resulting [`BspTree`] for spatial queries. The runtime
//! [`Blockmap`] grid for broad-phase object queries lives here too.

mod blockmap;
mod cut_list;
mod errors;
mod mesh;
mod node_builder;
mod subsector;
mod superblock;
mod tree;

#[cfg(test)]
mod test_support;

pub use crate::blockmap::{Blockmap, CellBlock, BLOCKMAP_CELL_SIZE};
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::mesh::{EdgeGeom, HalfEdge, HalfEdgeId, Mesh, SplitResult, Vertex, VertexId};
pub use crate::node_builder::{BuildStats, NodeBuilder};
pub use crate::subsector::{Subsector, SubsectorId};
pub use crate::tree::{BspNode, BspTree, InternalNode};

use failchain::ResultExt;
use log::info;
use map::Geometry;

/// Distance below which a point is considered to lie on a line. The
/// partitioner snaps everything closer than this onto the partition.
pub const DIST_EPSILON: f64 = 1.0 / 128.0;

/// Build-time tuning knobs.
#[derive(Copy, Clone, Debug)]
pub struct Config {
    /// Relative cost of splitting a half-edge versus unbalancing the tree.
    /// Higher values favour balanced trees with fewer splits.
    pub split_factor: i32,
}

impl Default for Config {
    fn default() -> Config {
        Config { split_factor: 7 }
    }
}

/// Everything `build` produces: the partitioned mesh, the tree over it and
/// the counters accumulated while building.
pub struct BspData {
    pub mesh: Mesh,
    pub tree: BspTree,
    pub stats: BuildStats,
}

pub fn build(geometry: &Geometry, config: &Config) -> Result<BspData> {
    geometry
        .validate()
        .chain_err(|| ErrorKind::InvalidGeometry("cross-reference check failed".to_owned()))?;

    let mut mesh = Mesh::from_geometry(geometry);
    let (tree, stats) = NodeBuilder::new(&mut mesh, config).build()?;
    info!(
        "Built BSP tree: {} nodes, {} subsectors, height {}, {} splits, {} mini half-edges",
        stats.num_nodes,
        stats.num_subsectors,
        tree.height(),
        stats.num_splits,
        stats.num_mini_half_edges
    );
    Ok(BspData { mesh, tree, stats })
}

#[cfg(test)]
mod test {
    use super::{build, Config, ErrorKind};
    use crate::test_support::GeometryBuilder;
    use map::{Geometry, Linedef, NO_SIDEDEF};

    #[test]
    fn empty_geometry_is_an_error() {
        let error = build(&GeometryBuilder::new().build(), &Config::default())
            .err()
            .expect("empty geometry must fail");
        assert_eq!(*error.kind(), ErrorKind::EmptyMap);
    }

    #[test]
    fn dangling_references_are_an_error() {
        let geometry = Geometry {
            vertices: Vec::new(),
            linedefs: vec![Linedef {
                start_vertex: 0,
                end_vertex: 1,
                flags: 0,
                special_type: 0,
                sector_tag: 0,
                right_side: NO_SIDEDEF,
                left_side: NO_SIDEDEF,
                polyobj: false,
            }],
            sidedefs: Vec::new(),
            sectors: Vec::new(),
        };
        let error = build(&geometry, &Config::default())
            .err()
            .expect("dangling refs must fail");
        assert!(matches!(*error.kind(), ErrorKind::InvalidGeometry(_)));
    }

    #[test]
    fn stats_reflect_the_build() {
        let mut builder = GeometryBuilder::new();
        let sector = builder.add_sector();
        builder.ring(sector, &[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]);
        let data = build(&builder.build(), &Config::default()).expect("build failed");
        assert_eq!(data.stats.num_nodes, 0);
        assert_eq!(data.stats.num_subsectors, 1);
        assert_eq!(data.stats.num_splits, 0);
        assert_eq!(data.stats.num_mini_half_edges, 0);
        assert_eq!(data.stats.num_half_edges, 8);
        assert_eq!(data.stats.num_vertices, 4);
    }
}
