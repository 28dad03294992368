//! Decoding of the camera images paired with point cloud frames

use pcdseq_core::{Error, ImageFrame, Result};
use std::path::Path;

/// Decode an image file into an RGBA8 [`ImageFrame`].
///
/// The pixel buffer is allocated per call and sized from the decoded
/// dimensions.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<ImageFrame> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::NotFound(format!("image file {} does not exist", path.display())));
    }

    let decoded = image::open(path)
        .map_err(|e| Error::Image(format!("cannot decode {}: {}", path.display(), e)))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    ImageFrame::from_rgba(width, height, rgba.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut img = image::RgbImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgb([200, 100, 50]));
        img.save(&path).unwrap();

        let frame = load_image(&path).unwrap();
        assert_eq!((frame.width(), frame.height()), (3, 2));
        assert_eq!(frame.as_bytes().len(), 3 * 2 * 4);
        assert_eq!(frame.pixel(2, 1), Some([200, 100, 50, 255]));
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_image(dir.path().join("nope.png"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_corrupt_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(load_image(&path), Err(Error::Image(_))));
    }
}
