//! I/O operations for point cloud sequences
//!
//! This crate discovers the frames of a sequence and reads the files that
//! make up one frame: the PCD point cloud, the optional companion image and
//! the optional JSON box annotations.

pub mod pcd;
pub mod annotation;
pub mod frame_image;
pub mod catalog;

pub use pcd::{PcdReader, PcdWriter, PcdHeader, PcdDataFormat};
pub use annotation::{load_annotations, parse_annotations, ANNOTATION_EXTENSION};
pub use frame_image::load_image;
pub use catalog::{advance_index, companion_path, FrameCatalog};

use pcdseq_core::{Error, PointCloud, Point3f, Result};
use std::path::Path;

/// Trait for reading point clouds from files
pub trait PointCloudReader {
    fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud<Point3f>>;
}

/// Auto-detect format and read point cloud
pub fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud<Point3f>> {
    let path = path.as_ref();
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pcd") => PcdReader::read_point_cloud(path),
        other => Err(Error::load(
            path,
            format!("unsupported point cloud format: {:?}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension_is_a_load_error() {
        let result = read_point_cloud("frame.xyz");
        assert!(matches!(result, Err(Error::Load { .. })));
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let result = read_point_cloud("/definitely/not/here/frame.pcd");
        assert!(matches!(result, Err(Error::Load { .. })));
    }
}
