//! Nearest-neighbor resampling.
//!
//! Destination pixel `d` on an axis of length `dst` samples the source pixel
//! under its center, `floor((d + 0.5) * src / dst)`. When `dst` is not a
//! multiple of `src` the replicated blocks differ in size by at most one
//! pixel (80 → 512 gives blocks of 6 and 7), and no pixel is ever blended.

use image::{DynamicImage, ImageBuffer, Pixel};

/// Source coordinate under the center of destination coordinate `dst`.
#[inline]
pub fn source_index(dst: u32, src_len: u32, dst_len: u32) -> u32 {
    (((2 * dst as u64 + 1) * src_len as u64) / (2 * dst_len as u64)) as u32
}

pub fn resample_nearest<P: Pixel>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    width: u32,
    height: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let (src_w, src_h) = src.dimensions();
    let x_map: Vec<u32> = (0..width).map(|x| source_index(x, src_w, width)).collect();
    let y_map: Vec<u32> = (0..height).map(|y| source_index(y, src_h, height)).collect();

    ImageBuffer::from_fn(width, height, |x, y| {
        *src.get_pixel(x_map[x as usize], y_map[y as usize])
    })
}

/// Resize keeping the color mode of 8-bit images; deeper images are
/// narrowed to 8-bit RGB, or RGBA when they carry alpha.
pub fn resize_nearest(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(resample_nearest(buf, width, height)),
        DynamicImage::ImageLumaA8(buf) => {
            DynamicImage::ImageLumaA8(resample_nearest(buf, width, height))
        }
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(resample_nearest(buf, width, height)),
        DynamicImage::ImageRgba8(buf) => {
            DynamicImage::ImageRgba8(resample_nearest(buf, width, height))
        }
        other if other.color().has_alpha() => {
            DynamicImage::ImageRgba8(resample_nearest(&other.to_rgba8(), width, height))
        }
        other => DynamicImage::ImageRgb8(resample_nearest(&other.to_rgb8(), width, height)),
    }
}
