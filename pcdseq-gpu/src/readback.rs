//! Copy a rendered texture back to host memory

use crate::device::GpuContext;
use pcdseq_core::{Error, Result};

const BYTES_PER_PIXEL: u32 = 4;

/// Row pitch wgpu requires for texture-to-buffer copies of `width` pixels
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strip the per-row padding of a buffer copied out of a texture
pub fn unpad_rows(data: &[u8], width: u32, height: u32, padded_bytes_per_row: u32) -> Vec<u8> {
    let row = (width * BYTES_PER_PIXEL) as usize;
    let pitch = padded_bytes_per_row as usize;
    let mut pixels = Vec::with_capacity(row * height as usize);
    for chunk in data.chunks(pitch).take(height as usize) {
        pixels.extend_from_slice(&chunk[..row.min(chunk.len())]);
    }
    pixels
}

/// Finish `encoder` with a copy of `texture` into a mappable buffer, then wait
/// for the GPU and return the tightly packed 4-byte pixels.
pub(crate) fn read_texture(
    gpu: &GpuContext,
    mut encoder: wgpu::CommandEncoder,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    let padded = padded_bytes_per_row(width);
    let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: (padded * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = buffer.slice(..);
    let (sender, receiver) = flume::bounded(1);
    buffer_slice.map_async(wgpu::MapMode::Read, move |v| {
        let _ = sender.send(v);
    });
    let _ = gpu.device.poll(wgpu::Maintain::Wait);

    receiver
        .recv()
        .map_err(|_| Error::Gpu("readback channel closed before mapping finished".to_string()))??;

    let pixels = {
        let data = buffer_slice.get_mapped_range();
        unpad_rows(&data, width, height, padded)
    };
    buffer.unmap();
    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_row_is_aligned() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(640) % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);
    }

    #[test]
    fn test_unpad_rows() {
        let width = 2;
        let height = 3;
        let pitch = 12;
        let mut data = Vec::new();
        for row in 0..height {
            for px in 0..8u8 {
                data.push(row as u8 * 10 + px);
            }
            data.extend_from_slice(&[0xEE; 4]);
        }

        let pixels = unpad_rows(&data, width, height, pitch);
        assert_eq!(pixels.len(), 2 * 3 * 4);
        assert_eq!(&pixels[0..8], &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(&pixels[8..16], &[10, 11, 12, 13, 14, 15, 16, 17]);
        assert!(!pixels.contains(&0xEE));
    }

    #[test]
    fn test_unpad_rows_without_padding() {
        let data: Vec<u8> = (0..16).collect();
        assert_eq!(unpad_rows(&data, 2, 2, 8), data);
    }
}
