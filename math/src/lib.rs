pub mod angles;
pub mod bbox;
pub mod line;
pub mod vector;

pub use self::angles::{bams_atan2, bams_distance, ANGLE_EPSILON};
pub use self::bbox::Aabb;
pub use self::line::{Line2, Line2d};
pub use self::vector::{Field, Vec2, Vec2d, Vector};
