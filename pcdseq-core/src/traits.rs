//! Core traits for pcdseq

use crate::{point::*, point_cloud::*};

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the axis-aligned bounding box of the object as `(min, max)`
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        nalgebra::center(&min, &max)
    }
}

impl<T: Positioned> Drawable for PointCloud<T> {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        let mut points = self.iter().map(Positioned::position);
        let first = match points.next() {
            Some(p) => p,
            None => return (Point3f::origin(), Point3f::origin()),
        };

        points.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let cloud = PointCloud::from_points(vec![
            Point3f::new(1.0, -2.0, 0.5),
            Point3f::new(-1.0, 4.0, 0.0),
            Point3f::new(0.0, 0.0, 3.0),
        ]);

        let (min, max) = cloud.bounding_box();
        assert_eq!(min, Point3f::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Point3f::new(1.0, 4.0, 3.0));
        assert_eq!(cloud.center(), Point3f::new(0.0, 1.0, 1.5));
    }

    #[test]
    fn test_empty_bounding_box() {
        let cloud = PointCloud::<Point3f>::new();
        assert_eq!(cloud.bounding_box(), (Point3f::origin(), Point3f::origin()));
    }
}
