//! Core data structures for pcdseq
//!
//! This crate provides the fundamental types shared by the sequence viewer:
//! points and point clouds, annotated 3D bounding boxes, decoded image frames,
//! Euler-angle helpers and the common error type.

pub mod point;
pub mod point_cloud;
pub mod bbox;
pub mod image;
pub mod traits;
pub mod transform;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use bbox::*;
pub use image::*;
pub use traits::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix3, Matrix4, UnitQuaternion, Quaternion};

