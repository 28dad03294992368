//! Annotated 3D bounding boxes

use crate::error::{Error, Result};
use crate::point::Point3f;
use crate::transform::euler_angles_xyz;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// An oriented 3D box read from a per-frame annotation file.
///
/// `width`, `height` and `depth` are full extents along the box's own
/// x, y and z axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3D {
    pub id: String,
    pub translation: Point3f,
    pub rotation: UnitQuaternion<f32>,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl BoundingBox3D {
    /// Create a box, rejecting empty ids and non-positive or non-finite sizes
    pub fn new(
        id: impl Into<String>,
        translation: Point3f,
        rotation: UnitQuaternion<f32>,
        width: f32,
        height: f32,
        depth: f32,
    ) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidData("bounding box id must not be empty".to_string()));
        }
        for (name, value) in [("width", width), ("height", height), ("depth", depth)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidData(format!(
                    "bounding box '{}' has invalid {}: {}",
                    id, name, value
                )));
            }
        }
        if !translation.iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidData(format!(
                "bounding box '{}' has a non-finite translation",
                id
            )));
        }

        Ok(Self {
            id,
            translation,
            rotation,
            width,
            height,
            depth,
        })
    }

    /// X-Y-Z Euler decomposition of the box rotation, used to orient labels
    pub fn euler_angles(&self) -> Vector3<f32> {
        euler_angles_xyz(&self.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_box() {
        let bbox = BoundingBox3D::new(
            "car_1",
            Point3f::new(1.0, 2.0, 3.0),
            UnitQuaternion::identity(),
            2.0,
            1.0,
            3.0,
        )
        .unwrap();

        assert_eq!(bbox.id, "car_1");
        assert_eq!(bbox.translation, Point3f::new(1.0, 2.0, 3.0));
        assert_eq!((bbox.width, bbox.height, bbox.depth), (2.0, 1.0, 3.0));
        assert_eq!(bbox.euler_angles(), Vector3::zeros());
    }

    #[test]
    fn test_rejects_bad_sizes() {
        let make = |w: f32, h: f32, d: f32| {
            BoundingBox3D::new("a", Point3f::origin(), UnitQuaternion::identity(), w, h, d)
        };

        assert!(make(0.0, 1.0, 1.0).is_err());
        assert!(make(1.0, -1.0, 1.0).is_err());
        assert!(make(1.0, 1.0, f32::NAN).is_err());
        assert!(make(1.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_rejects_empty_id() {
        let result = BoundingBox3D::new("", Point3f::origin(), UnitQuaternion::identity(), 1.0, 1.0, 1.0);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }
}
