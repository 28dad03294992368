//! Decoded image frames shown next to the 3D view

use crate::error::{Error, Result};

/// An RGBA8 image owning its pixel buffer.
///
/// The buffer is always exactly `width * height * 4` bytes, row-major with
/// no padding between rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageFrame {
    pub const CHANNELS: usize = 4;

    /// Wrap an RGBA8 buffer, checking it matches the given dimensions
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = Self::buffer_len(width, height)?;
        if data.len() != expected {
            return Err(Error::Image(format!(
                "buffer holds {} bytes, expected {} for {}x{} RGBA",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self { width, height, data })
    }

    fn buffer_len(width: u32, height: u32) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(Error::Image(format!("invalid image size {}x{}", width, height)));
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(Self::CHANNELS))
            .ok_or_else(|| Error::Image(format!("image too large: {}x{}", width, height)))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// RGBA value of a single pixel, if in bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y as usize) * (self.width as usize) + x as usize) * Self::CHANNELS;
        let px = &self.data[offset..offset + Self::CHANNELS];
        Some([px[0], px[1], px[2], px[3]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_lookup() {
        let data = vec![10, 20, 30, 255, 40, 50, 60, 128];
        let frame = ImageFrame::from_rgba(2, 1, data).unwrap();

        assert_eq!(frame.as_bytes().len(), 8);
        assert_eq!(frame.pixel(0, 0), Some([10, 20, 30, 255]));
        assert_eq!(frame.pixel(1, 0), Some([40, 50, 60, 128]));
        assert_eq!(frame.pixel(2, 0), None);
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        assert!(ImageFrame::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(ImageFrame::from_rgba(0, 2, vec![]).is_err());
    }
}
