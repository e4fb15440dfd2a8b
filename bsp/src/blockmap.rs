use log::debug;
use math::{Aabb, Vec2d};

/// The classic blockmap resolution: one cell per 128 world units.
pub const BLOCKMAP_CELL_SIZE: f64 = 128.0;

/// Inclusive rectangle of cell coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellBlock {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

/// A uniform grid over the map bounds, bucketing values by position for
/// broad-phase queries. Values linked with `link_box` land in every cell
/// their box overlaps, so box queries may yield the same value more than
/// once; deduplication is the caller's business.
pub struct Blockmap<T: Copy + PartialEq> {
    origin: Vec2d,
    cell_size: f64,
    width: usize,
    height: usize,
    cells: Vec<Vec<T>>,
}

impl<T: Copy + PartialEq> Blockmap<T> {
    pub fn new(bounds: &Aabb, cell_size: f64) -> Blockmap<T> {
        let width = ((bounds.width() / cell_size).ceil() as usize).max(1);
        let height = ((bounds.height() / cell_size).ceil() as usize).max(1);
        Blockmap {
            origin: bounds.min,
            cell_size,
            width,
            height,
            cells: vec![Vec::new(); width * height],
        }
    }

    pub fn origin(&self) -> Vec2d {
        self.origin
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell coordinates of `point`, or `None` outside the grid. Points on
    /// the far edge count into the last cell.
    pub fn cell_at(&self, point: Vec2d) -> Option<(usize, usize)> {
        let x = (point[0] - self.origin[0]) / self.cell_size;
        let y = (point[1] - self.origin[1]) / self.cell_size;
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x > self.width || y > self.height || (x == self.width && point[0] > self.far_x())
            || (y == self.height && point[1] > self.far_y())
        {
            return None;
        }
        Some((x.min(self.width - 1), y.min(self.height - 1)))
    }

    /// The inclusive cell rectangle overlapped by `bounds`, clamped to the
    /// grid; `None` when the box misses the grid entirely.
    pub fn cell_block(&self, bounds: &Aabb) -> Option<CellBlock> {
        let x1 = ((bounds.min[0] - self.origin[0]) / self.cell_size).floor();
        let y1 = ((bounds.min[1] - self.origin[1]) / self.cell_size).floor();
        let x2 = ((bounds.max[0] - self.origin[0]) / self.cell_size).floor();
        let y2 = ((bounds.max[1] - self.origin[1]) / self.cell_size).floor();
        if x2 < 0.0 || y2 < 0.0 || x1 >= self.width as f64 || y1 >= self.height as f64 {
            return None;
        }
        Some(CellBlock {
            x1: x1.max(0.0) as usize,
            y1: y1.max(0.0) as usize,
            x2: (x2 as usize).min(self.width - 1),
            y2: (y2 as usize).min(self.height - 1),
        })
    }

    /// Link `value` into the cell containing `point`. Returns whether the
    /// point was on the grid.
    pub fn link_point(&mut self, point: Vec2d, value: T) -> bool {
        match self.cell_at(point) {
            Some((x, y)) => {
                let index = self.cell_index(x, y);
                self.cells[index].push(value);
                true
            }
            None => {
                debug!("Point outside blockmap bounds; not linked");
                false
            }
        }
    }

    /// Remove one occurrence of `value` from the cell containing `point`.
    pub fn unlink_point(&mut self, point: Vec2d, value: T) -> bool {
        match self.cell_at(point) {
            Some((x, y)) => {
                let index = self.cell_index(x, y);
                let cell = &mut self.cells[index];
                match cell.iter().position(|linked| *linked == value) {
                    Some(at) => {
                        cell.swap_remove(at);
                        true
                    }
                    None => false,
                }
            }
            None => false,
        }
    }

    /// Link `value` into every cell its box overlaps.
    pub fn link_box(&mut self, bounds: &Aabb, value: T) {
        if let Some(block) = self.cell_block(bounds) {
            for y in block.y1..=block.y2 {
                for x in block.x1..=block.x2 {
                    let index = self.cell_index(x, y);
                    self.cells[index].push(value);
                }
            }
        }
    }

    pub fn unlink_box(&mut self, bounds: &Aabb, value: T) {
        if let Some(block) = self.cell_block(bounds) {
            for y in block.y1..=block.y2 {
                for x in block.x1..=block.x2 {
                    let index = self.cell_index(x, y);
                    let cell = &mut self.cells[index];
                    if let Some(at) = cell.iter().position(|linked| *linked == value) {
                        cell.swap_remove(at);
                    }
                }
            }
        }
    }

    /// Visit every value in one cell; the visitor returns `false` to stop.
    /// Returns whether iteration ran to completion.
    pub fn iterate_cell<Visit>(&self, x: usize, y: usize, visit: &mut Visit) -> bool
    where
        Visit: FnMut(T) -> bool,
    {
        for &value in &self.cells[self.cell_index(x, y)] {
            if !visit(value) {
                return false;
            }
        }
        true
    }

    /// Visit every value in every cell the box overlaps.
    pub fn box_iterate<Visit>(&self, bounds: &Aabb, visit: &mut Visit) -> bool
    where
        Visit: FnMut(T) -> bool,
    {
        if let Some(block) = self.cell_block(bounds) {
            for y in block.y1..=block.y2 {
                for x in block.x1..=block.x2 {
                    if !self.iterate_cell(x, y, visit) {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn cell_index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn far_x(&self) -> f64 {
        self.origin[0] + self.cell_size * self.width as f64
    }

    fn far_y(&self) -> f64 {
        self.origin[1] + self.cell_size * self.height as f64
    }
}

#[cfg(test)]
mod test {
    use super::{Blockmap, CellBlock, BLOCKMAP_CELL_SIZE};
    use crate::test_support::GeometryBuilder;
    use crate::{build, Config};
    use math::{Aabb, Vec2d};

    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn coord(&mut self, limit: f64) -> f64 {
            (self.next() % 1_000_000) as f64 / 1_000_000.0 * limit
        }
    }

    fn bounds(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Aabb {
        Aabb {
            min: Vec2d::new(min_x, min_y),
            max: Vec2d::new(max_x, max_y),
        }
    }

    #[test]
    fn cell_at_clamps_the_far_edge_and_rejects_outside() {
        let map: Blockmap<u32> = Blockmap::new(&bounds(0.0, 0.0, 256.0, 256.0), 128.0);
        assert_eq!(map.width(), 2);
        assert_eq!(map.height(), 2);
        assert_eq!(map.cell_at(Vec2d::new(0.0, 0.0)), Some((0, 0)));
        assert_eq!(map.cell_at(Vec2d::new(255.0, 10.0)), Some((1, 0)));
        assert_eq!(map.cell_at(Vec2d::new(256.0, 256.0)), Some((1, 1)));
        assert_eq!(map.cell_at(Vec2d::new(-1.0, 10.0)), None);
        assert_eq!(map.cell_at(Vec2d::new(10.0, 257.0)), None);
    }

    #[test]
    fn point_links_round_trip() {
        let mut map = Blockmap::new(&bounds(0.0, 0.0, 512.0, 512.0), 128.0);
        let point = Vec2d::new(200.0, 300.0);
        assert!(map.link_point(point, 7_u32));

        let mut seen = Vec::new();
        map.box_iterate(&bounds(150.0, 250.0, 250.0, 350.0), &mut |value| {
            seen.push(value);
            true
        });
        assert_eq!(seen, vec![7]);

        assert!(map.unlink_point(point, 7));
        assert!(!map.unlink_point(point, 7));
        let mut empty = true;
        map.box_iterate(&bounds(0.0, 0.0, 512.0, 512.0), &mut |_| {
            empty = false;
            true
        });
        assert!(empty);
    }

    #[test]
    fn box_links_cover_every_overlapped_cell() {
        let mut map = Blockmap::new(&bounds(0.0, 0.0, 512.0, 512.0), 128.0);
        map.link_box(&bounds(100.0, 100.0, 300.0, 150.0), 1_u32);
        assert_eq!(
            map.cell_block(&bounds(100.0, 100.0, 300.0, 150.0)),
            Some(CellBlock {
                x1: 0,
                y1: 0,
                x2: 2,
                y2: 1,
            })
        );

        // Query away from the box sees nothing.
        let mut hits = 0;
        map.box_iterate(&bounds(400.0, 400.0, 500.0, 500.0), &mut |_| {
            hits += 1;
            true
        });
        assert_eq!(hits, 0);

        // A query over one overlapped cell sees it exactly once.
        let mut hits = 0;
        map.iterate_cell(2, 1, &mut |_| {
            hits += 1;
            true
        });
        assert_eq!(hits, 1);

        map.unlink_box(&bounds(100.0, 100.0, 300.0, 150.0), 1);
        let mut hits = 0;
        map.box_iterate(&bounds(0.0, 0.0, 512.0, 512.0), &mut |_| {
            hits += 1;
            true
        });
        assert_eq!(hits, 0);
    }

    #[test]
    fn early_exit_stops_the_walk() {
        let mut map = Blockmap::new(&bounds(0.0, 0.0, 128.0, 128.0), 128.0);
        map.link_point(Vec2d::new(1.0, 1.0), 1_u32);
        map.link_point(Vec2d::new(2.0, 2.0), 2_u32);
        let mut visits = 0;
        let finished = map.box_iterate(&bounds(0.0, 0.0, 128.0, 128.0), &mut |_| {
            visits += 1;
            false
        });
        assert!(!finished);
        assert_eq!(visits, 1);
    }

    #[test]
    fn level_subsectors_bucket_into_a_map_sized_grid() {
        crate::test_support::init_logging();
        let mut builder = GeometryBuilder::new();
        let sector = builder.add_sector();
        builder.ring(
            sector,
            &[
                (0.0, 0.0),
                (0.0, 256.0),
                (128.0, 256.0),
                (128.0, 128.0),
                (256.0, 128.0),
                (256.0, 0.0),
            ],
        );
        let geometry = builder.build();
        let data = build(&geometry, &Config::default()).expect("build failed");
        let world = geometry.bounding_box().expect("level has vertices");

        let mut map = Blockmap::new(&world, BLOCKMAP_CELL_SIZE);
        assert_eq!(map.width(), 2);
        assert_eq!(map.height(), 2);
        for (id, subsector) in data.tree.subsectors().iter().enumerate() {
            assert!(world.contains(subsector.mid_point));
            assert!(map.link_point(subsector.mid_point, id));
        }

        let mut seen = Vec::new();
        map.box_iterate(&world, &mut |id| {
            seen.push(id);
            true
        });
        seen.sort_unstable();
        let all: Vec<usize> = (0..data.tree.subsectors().len()).collect();
        assert_eq!(seen, all);
    }

    #[test]
    fn thousand_object_churn() {
        let world = bounds(0.0, 0.0, 8192.0, 8192.0);
        let mut map = Blockmap::new(&world, BLOCKMAP_CELL_SIZE);
        assert_eq!(map.width(), 64);
        assert_eq!(map.height(), 64);

        let mut random = XorShift(0x2545_f491_4f6c_dd1d);
        let points: Vec<Vec2d> = (0..1000)
            .map(|_| Vec2d::new(random.coord(8192.0), random.coord(8192.0)))
            .collect();
        for (id, &point) in points.iter().enumerate() {
            assert!(map.link_point(point, id));
        }
        for (id, &point) in points.iter().enumerate().take(500) {
            assert!(map.unlink_point(point, id));
        }

        let mut survivors = Vec::new();
        map.box_iterate(&world, &mut |id| {
            survivors.push(id);
            true
        });
        assert_eq!(survivors.len(), 500);
        assert!(survivors.iter().all(|&id| id >= 500));
    }
}
