use super::vector::Vec2d;

/// Axis-aligned bounding box over `f64` world coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2d,
    pub max: Vec2d,
}

impl Aabb {
    pub fn from_point(point: Vec2d) -> Aabb {
        Aabb {
            min: point,
            max: point,
        }
    }

    pub fn from_points<I: IntoIterator<Item = Vec2d>>(points: I) -> Option<Aabb> {
        let mut points = points.into_iter();
        let mut bbox = Aabb::from_point(points.next()?);
        for point in points {
            bbox.include(point);
        }
        Some(bbox)
    }

    pub fn include(&mut self, point: Vec2d) {
        if point[0] < self.min[0] {
            self.min[0] = point[0];
        }
        if point[1] < self.min[1] {
            self.min[1] = point[1];
        }
        if point[0] > self.max[0] {
            self.max[0] = point[0];
        }
        if point[1] > self.max[1] {
            self.max[1] = point[1];
        }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut merged = *self;
        merged.include(other.min);
        merged.include(other.max);
        merged
    }

    pub fn mid(&self) -> Vec2d {
        (self.min + self.max) * 0.5
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn contains(&self, point: Vec2d) -> bool {
        point[0] >= self.min[0]
            && point[0] <= self.max[0]
            && point[1] >= self.min[1]
            && point[1] <= self.max[1]
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min[0] <= other.max[0]
            && self.max[0] >= other.min[0]
            && self.min[1] <= other.max[1]
            && self.max[1] >= other.min[1]
    }

    pub fn corners(&self) -> [Vec2d; 4] {
        [
            self.min,
            Vec2d::new(self.max[0], self.min[1]),
            self.max,
            Vec2d::new(self.min[0], self.max[1]),
        ]
    }
}
