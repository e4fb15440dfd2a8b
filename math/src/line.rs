use super::vector::{Field, Vec2, Vector};
use num_traits::{Float, NumCast, Zero};

pub type Line2d = Line2<f64>;

/// A directed line with a unit `displace` direction and the `length` of the
/// segment it was built from. `signed_distance` is positive on the right of
/// the direction of travel.
#[derive(Copy, Clone, Debug)]
pub struct Line2<T: Copy + Field + Float + NumCast> {
    pub origin: Vec2<T>,
    pub displace: Vec2<T>,
    pub length: T,
}

impl<T: Copy + Field + Float + NumCast> Line2<T> {
    pub fn from_origin_and_displace(origin: Vec2<T>, displace: Vec2<T>) -> Line2<T> {
        let length = displace.norm();
        if length.abs() >= <T as NumCast>::from(1e-16).unwrap() {
            Line2 {
                origin,
                displace: displace / length,
                length,
            }
        } else {
            Line2 {
                origin,
                displace: Vec2::zero(),
                length: T::zero(),
            }
        }
    }

    pub fn from_two_points(origin: Vec2<T>, towards: Vec2<T>) -> Line2<T> {
        Self::from_origin_and_displace(origin, towards - origin)
    }

    pub fn inverted_halfspaces(&self) -> Line2<T> {
        Line2 {
            origin: self.origin,
            displace: -self.displace,
            length: self.length,
        }
    }

    pub fn signed_distance(&self, to: &Vec2<T>) -> T {
        to.cross(&self.displace) + self.displace.cross(&self.origin)
    }

    /// Distance along the line's direction from its origin to the projection
    /// of `point` onto the line.
    pub fn offset_of(&self, point: &Vec2<T>) -> T {
        (*point - self.origin).dot(&self.displace)
    }

    pub fn offset_at(&self, point: &Vec2<T>) -> T {
        if self.displace[0].abs() > self.displace[1].abs() {
            (point[0] - self.origin[0]) / self.displace[0]
        } else {
            (point[1] - self.origin[1]) / self.displace[1]
        }
    }

    pub fn intersect_offset(&self, other: &Line2<T>) -> Option<T> {
        let denominator = self.displace.cross(&other.displace);
        if denominator.abs() < <T as NumCast>::from(1e-16).unwrap() {
            None
        } else {
            Some((other.origin - self.origin).cross(&other.displace) / denominator)
        }
    }

    pub fn intersect_point(&self, other: &Line2<T>) -> Option<Vec2<T>> {
        self.intersect_offset(other).map(|offset| self.at_offset(offset))
    }

    pub fn at_offset(&self, offset: T) -> Vec2<T> {
        self.origin + self.displace * offset
    }
}

#[cfg(test)]
mod test {
    use super::Line2d;
    use crate::vector::Vec2;

    #[test]
    fn signed_distance_is_positive_on_the_right() {
        let line = Line2d::from_two_points(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0));
        assert!(line.signed_distance(&Vec2::new(0.5, -1.0)) > 0.0);
        assert!(line.signed_distance(&Vec2::new(0.5, 1.0)) < 0.0);
        assert_eq!(line.signed_distance(&Vec2::new(7.0, 0.0)), 0.0);
    }

    #[test]
    fn offsets_round_trip() {
        let line = Line2d::from_two_points(Vec2::new(1.0, 1.0), Vec2::new(4.0, 5.0));
        assert_eq!(line.length, 5.0);
        let point = line.at_offset(2.5);
        assert!((line.offset_of(&point) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn intersect_crossing_lines() {
        let a = Line2d::from_two_points(Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0));
        let b = Line2d::from_two_points(Vec2::new(2.0, -1.0), Vec2::new(2.0, 1.0));
        let point = a.intersect_point(&b).unwrap();
        assert!((point[0] - 2.0).abs() < 1e-12);
        assert!(point[1].abs() < 1e-12);
    }
}
