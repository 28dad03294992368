//! Per-frame 3D box annotations stored as JSON
//!
//! A file holds either a bare array of boxes or an object with a `boxes`
//! array:
//!
//! ```json
//! {"boxes": [{"id": "car_1",
//!             "translation": [1.0, 2.0, 3.0],
//!             "rotation": {"w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0},
//!             "width": 2.0, "height": 1.0, "depth": 3.0}]}
//! ```
//!
//! Vectors may be written as arrays or as objects. Rotations are quaternions
//! in `w, x, y, z` order.

use itertools::Itertools;
use log::debug;
use nalgebra::{Quaternion, UnitQuaternion};
use pcdseq_core::{BoundingBox3D, Error, Point3f, Result};
use serde::Deserialize;
use std::path::Path;

/// File extension of annotation files, including the dot
pub const ANNOTATION_EXTENSION: &str = ".json";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnnotationDocument {
    List(Vec<RawBox>),
    Object { boxes: Vec<RawBox> },
}

#[derive(Debug, Deserialize)]
struct RawBox {
    id: String,
    translation: RawVector,
    rotation: RawQuaternion,
    width: f32,
    height: f32,
    depth: f32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawVector {
    Array([f32; 3]),
    Object { x: f32, y: f32, z: f32 },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawQuaternion {
    Array([f32; 4]),
    Object { w: f32, x: f32, y: f32, z: f32 },
}

impl RawVector {
    fn to_point(&self) -> Point3f {
        match *self {
            RawVector::Array([x, y, z]) | RawVector::Object { x, y, z } => Point3f::new(x, y, z),
        }
    }
}

impl RawQuaternion {
    fn to_unit(&self, id: &str) -> Result<UnitQuaternion<f32>> {
        let (w, x, y, z) = match *self {
            RawQuaternion::Array([w, x, y, z]) | RawQuaternion::Object { w, x, y, z } => (w, x, y, z),
        };
        let q = Quaternion::new(w, x, y, z);
        let norm = q.norm();
        if !norm.is_finite() || norm < f32::EPSILON {
            return Err(Error::Annotation(format!(
                "box '{}' has a degenerate rotation quaternion",
                id
            )));
        }
        Ok(UnitQuaternion::from_quaternion(q))
    }
}

/// Parse the boxes of one frame from JSON text
pub fn parse_annotations(json: &str) -> Result<Vec<BoundingBox3D>> {
    let document: AnnotationDocument =
        serde_json::from_str(json).map_err(|e| Error::Annotation(e.to_string()))?;
    let raw = match document {
        AnnotationDocument::List(boxes) | AnnotationDocument::Object { boxes } => boxes,
    };

    if let Some(duplicate) = raw.iter().map(|b| b.id.as_str()).duplicates().next() {
        return Err(Error::Annotation(format!("duplicate box id '{}'", duplicate)));
    }

    raw.iter()
        .map(|b| {
            let rotation = b.rotation.to_unit(&b.id)?;
            BoundingBox3D::new(
                b.id.clone(),
                b.translation.to_point(),
                rotation,
                b.width,
                b.height,
                b.depth,
            )
            .map_err(|e| Error::Annotation(e.to_string()))
        })
        .collect()
}

/// Read and parse an annotation file
pub fn load_annotations<P: AsRef<Path>>(path: P) -> Result<Vec<BoundingBox3D>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::NotFound(format!(
            "annotation file {} does not exist",
            path.display()
        )));
    }

    let text = std::fs::read_to_string(path)?;
    let boxes = parse_annotations(&text)
        .map_err(|e| Error::Annotation(format!("{}: {}", path.display(), e)))?;

    for bbox in &boxes {
        debug!(
            "load-bbox {}: (x, y, z) = ({}, {}, {}), (w, h, d) = ({}, {}, {})",
            bbox.id,
            bbox.translation.x,
            bbox.translation.y,
            bbox.translation.z,
            bbox.width,
            bbox.height,
            bbox.depth
        );
    }
    Ok(boxes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn test_parse_object_document() {
        let json = r#"{"boxes": [{"id": "A", "translation": [1, 2, 3], "rotation": [1, 0, 0, 0],
                       "width": 2, "height": 1, "depth": 3}]}"#;
        let boxes = parse_annotations(json).unwrap();

        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].id, "A");
        assert_eq!(boxes[0].translation, Point3f::new(1.0, 2.0, 3.0));
        assert_eq!(boxes[0].rotation, UnitQuaternion::identity());
        assert_eq!((boxes[0].width, boxes[0].height, boxes[0].depth), (2.0, 1.0, 3.0));
    }

    #[test]
    fn test_parse_list_with_object_vectors() {
        let json = r#"[
            {"id": "ped", "translation": {"x": -1.0, "y": 0.5, "z": 0.0},
             "rotation": {"w": 0.0, "x": 0.0, "y": 0.0, "z": 2.0},
             "width": 0.5, "height": 1.8, "depth": 0.5},
            {"id": "car", "translation": [4, 4, 0], "rotation": [1, 0, 0, 0],
             "width": 4.5, "height": 1.5, "depth": 2.0}
        ]"#;
        let boxes = parse_annotations(json).unwrap();

        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].id, "ped");
        // Quaternions are normalized on load
        assert_relative_eq!(boxes[0].rotation.quaternion().k, 1.0, epsilon = 1e-6);
        assert_eq!(boxes[1].translation, Point3f::new(4.0, 4.0, 0.0));
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_annotations("[]").unwrap().is_empty());
        assert!(parse_annotations(r#"{"boxes": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse_annotations("not json").is_err());
        assert!(parse_annotations(r#"{"boxes": [{"id": "A"}]}"#).is_err());
        assert!(parse_annotations(
            r#"[{"id": "A", "translation": [0, 0, 0], "rotation": [0, 0, 0, 0], "width": 1, "height": 1, "depth": 1}]"#
        )
        .is_err());
        assert!(parse_annotations(
            r#"[{"id": "A", "translation": [0, 0, 0], "rotation": [1, 0, 0, 0], "width": -1, "height": 1, "depth": 1}]"#
        )
        .is_err());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let json = r#"[
            {"id": "A", "translation": [0, 0, 0], "rotation": [1, 0, 0, 0], "width": 1, "height": 1, "depth": 1},
            {"id": "A", "translation": [1, 0, 0], "rotation": [1, 0, 0, 0], "width": 1, "height": 1, "depth": 1}
        ]"#;
        let err = parse_annotations(json).unwrap_err();
        assert!(err.to_string().contains("duplicate box id 'A'"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_annotations(dir.path().join("absent.json"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"boxes": [{{"id": "B", "translation": [0, 0, 1], "rotation": [1, 0, 0, 0], "width": 1, "height": 2, "depth": 3}}]}}"#
        )
        .unwrap();

        let boxes = load_annotations(&path).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].id, "B");
    }
}
