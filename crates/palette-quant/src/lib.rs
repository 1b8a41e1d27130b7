use std::collections::HashMap;
use std::fmt;

use common_types::{IndexedImage, PixelArtError, DEFAULT_KMEANS_ITERATIONS, MAX_PALETTE_SIZE};
use image::{ColorType, RgbaImage};
use tracing::{debug, info};

pub mod histogram;
pub mod median_cut;
pub mod octree;
pub mod refine;

pub use histogram::{ColorCount, ColorHistogram};

/// Entry reserved for fully transparent pixels
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Palette construction algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizeStrategy {
    /// Alpha-aware color tree, used whenever the image carries transparency
    Octree,
    /// Histogram partitioning, better palettes for opaque content
    MedianCut,
}

impl QuantizeStrategy {
    /// Octree for color types with an alpha channel, median cut otherwise.
    pub fn for_color_type(color: ColorType) -> Self {
        if color.has_alpha() {
            QuantizeStrategy::Octree
        } else {
            QuantizeStrategy::MedianCut
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QuantizeStrategy::Octree => "octree",
            QuantizeStrategy::MedianCut => "median_cut",
        }
    }

    fn build_palette(&self, colors: &[ColorCount], max_colors: usize) -> Vec<[u8; 4]> {
        match self {
            QuantizeStrategy::Octree => octree::octree_palette(colors, max_colors),
            QuantizeStrategy::MedianCut => median_cut::median_cut_palette(colors, max_colors),
        }
    }
}

impl fmt::Display for QuantizeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Palette quantizer: strategy, k-means refinement, nearest-color mapping.
/// Never dithers.
#[derive(Debug, Clone)]
pub struct Quantizer {
    strategy: QuantizeStrategy,
    max_colors: usize,
    kmeans_iterations: u32,
}

impl Quantizer {
    pub fn new(strategy: QuantizeStrategy, max_colors: usize) -> Self {
        Self {
            strategy,
            max_colors,
            kmeans_iterations: DEFAULT_KMEANS_ITERATIONS,
        }
    }

    /// Pick the strategy from the color type of the image being quantized.
    pub fn for_color_type(color: ColorType, max_colors: usize) -> Self {
        Self::new(QuantizeStrategy::for_color_type(color), max_colors)
    }

    pub fn with_kmeans_iterations(mut self, iterations: u32) -> Self {
        self.kmeans_iterations = iterations;
        self
    }

    pub fn strategy(&self) -> QuantizeStrategy {
        self.strategy
    }

    pub fn max_colors(&self) -> usize {
        self.max_colors
    }

    /// Reduce `image` to at most `max_colors` colors.
    ///
    /// When the image holds fully transparent pixels and the budget allows
    /// more than one color, a `[0, 0, 0, 0]` entry is reserved for them and
    /// the rest of the image shares the remaining budget, so transparency
    /// survives exactly.
    #[tracing::instrument(level = "info", skip(self, image), fields(strategy = %self.strategy))]
    pub fn quantize(&self, image: &RgbaImage) -> Result<IndexedImage, PixelArtError> {
        self.validate(image)?;

        let mut hist = ColorHistogram::from_pixels(image.pixels().map(|p| &p.0));
        let distinct = hist.len();

        let reserve_transparent = self.max_colors > 1 && hist.has_transparent();
        if reserve_transparent {
            hist.take_transparent();
        }
        let budget = self.max_colors - usize::from(reserve_transparent);

        info!(
            stage = "quantize",
            distinct_colors = distinct,
            max_colors = self.max_colors,
            reserve_transparent = reserve_transparent,
            "Building palette"
        );

        let mut palette = self.strategy.build_palette(hist.colors(), budget);
        for iteration in 0..self.kmeans_iterations {
            palette = refine::kmeans_pass(hist.colors(), &palette);
            debug!(stage = "quantize", iteration = iteration, "K-means pass");
        }

        if reserve_transparent {
            palette.push(TRANSPARENT);
        }
        // Deterministic order, duplicates from refinement merged.
        palette.sort_unstable();
        palette.dedup();

        let indices = self.map_pixels(image, &palette, reserve_transparent);

        info!(
            stage = "quantize",
            palette_size = palette.len(),
            "Quantization completed"
        );

        IndexedImage::new(image.width(), image.height(), palette, indices)
    }

    fn validate(&self, image: &RgbaImage) -> Result<(), PixelArtError> {
        if self.max_colors == 0 || self.max_colors > MAX_PALETTE_SIZE as usize {
            return Err(PixelArtError::QuantizationFailed {
                message: format!("max_colors must be in 1..=256, got {}", self.max_colors),
            });
        }

        if image.width() == 0 || image.height() == 0 {
            return Err(PixelArtError::QuantizationFailed {
                message: format!("empty image {}×{}", image.width(), image.height()),
            });
        }

        Ok(())
    }

    /// Nearest-entry lookup, computed once per distinct color.
    fn map_pixels(&self, image: &RgbaImage, palette: &[[u8; 4]], reserve_transparent: bool) -> Vec<u8> {
        let transparent_idx = palette.iter().position(|&p| p == TRANSPARENT);
        let mut lookup: HashMap<[u8; 4], u8> = HashMap::new();

        image
            .pixels()
            .map(|p| {
                let rgba = p.0;
                if reserve_transparent && rgba[3] == 0 {
                    if let Some(idx) = transparent_idx {
                        return idx as u8;
                    }
                }
                *lookup
                    .entry(rgba)
                    .or_insert_with(|| refine::nearest_index(rgba, palette) as u8)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_strategy_follows_alpha_channel() {
        assert_eq!(QuantizeStrategy::for_color_type(ColorType::Rgba8), QuantizeStrategy::Octree);
        assert_eq!(QuantizeStrategy::for_color_type(ColorType::La8), QuantizeStrategy::Octree);
        assert_eq!(QuantizeStrategy::for_color_type(ColorType::Rgb8), QuantizeStrategy::MedianCut);
        assert_eq!(QuantizeStrategy::for_color_type(ColorType::L8), QuantizeStrategy::MedianCut);
        assert_eq!(QuantizeStrategy::for_color_type(ColorType::Rgba16), QuantizeStrategy::Octree);
    }

    #[test]
    fn test_quantizer_creation() {
        let quantizer = Quantizer::new(QuantizeStrategy::MedianCut, 16).with_kmeans_iterations(3);
        assert_eq!(quantizer.max_colors(), 16);
        assert_eq!(quantizer.kmeans_iterations, 3);
        assert_eq!(quantizer.strategy().to_string(), "median_cut");
    }

    #[test]
    fn test_rejects_out_of_range_budget() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        assert!(Quantizer::new(QuantizeStrategy::Octree, 0).quantize(&image).is_err());
        assert!(Quantizer::new(QuantizeStrategy::Octree, 257).quantize(&image).is_err());
    }

    #[test]
    fn test_single_color_budget_ignores_reservation() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([200, 100, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 0, 0, 0]));

        let result = Quantizer::new(QuantizeStrategy::Octree, 1).quantize(&image).unwrap();
        assert_eq!(result.palette_len(), 1);
        assert_eq!(result.indices, vec![0, 0]);
    }

    #[test]
    fn test_transparent_pixels_use_reserved_entry() {
        let mut image = RgbaImage::from_pixel(4, 1, Rgba([10, 200, 30, 255]));
        image.put_pixel(0, 0, Rgba([255, 255, 255, 0]));
        image.put_pixel(3, 0, Rgba([12, 0, 7, 0]));

        let result = Quantizer::new(QuantizeStrategy::Octree, 2).quantize(&image).unwrap();
        let rgba = result.to_rgba();

        assert_eq!(rgba.get_pixel(0, 0).0, TRANSPARENT);
        assert_eq!(rgba.get_pixel(3, 0).0, TRANSPARENT);
        assert_eq!(rgba.get_pixel(1, 0).0, [10, 200, 30, 255]);
    }
}
