//! Point cloud container

use crate::point::*;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A generic point cloud container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

/// A point cloud with 3D points
pub type PointCloud3f = PointCloud<Point3f>;

/// A point cloud with colored points, as handed to the render surfaces
pub type ColoredPointCloud3f = PointCloud<ColoredPoint3f>;

impl<T> PointCloud<T> {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: T) {
        self.points.push(point);
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.points.iter()
    }
}

impl<T: Positioned> PointCloud<T> {
    /// Copy the cloud, painting every point with the same color.
    pub fn recolored(&self, color: [u8; 3]) -> ColoredPointCloud3f {
        self.points
            .iter()
            .map(|p| ColoredPoint3f::new(p.position(), color))
            .collect()
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recolor_keeps_positions() {
        let cloud = PointCloud::from_points(vec![
            Point3f::new(0.0, 1.0, 2.0),
            Point3f::new(-1.0, 0.5, 3.0),
        ]);

        let colored = cloud.recolored([10, 20, 30]);

        assert_eq!(colored.len(), 2);
        assert_eq!(colored[1].position, Point3f::new(-1.0, 0.5, 3.0));
        assert!(colored.iter().all(|p| p.color == [10, 20, 30]));
    }

    #[test]
    fn test_recolor_overwrites_existing_colors() {
        let cloud = PointCloud::from_points(vec![
            ColoredPoint3f::new(Point3f::origin(), [255, 0, 0]),
            ColoredPoint3f::new(Point3f::new(1.0, 1.0, 1.0), [0, 255, 0]),
        ]);

        let colored = cloud.recolored([0, 0, 0]);
        assert!(colored.iter().all(|p| p.color == [0, 0, 0]));
    }
}
