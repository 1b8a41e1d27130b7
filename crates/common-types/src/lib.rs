use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use thiserror::Error;

/// Pixel art defaults
pub const DEFAULT_TARGET_SIZE: (u32, u32) = (80, 80);
pub const DEFAULT_MAX_COLORS: u16 = 64;
pub const DEFAULT_PREVIEW_SIZE: (u32, u32) = (512, 512);
pub const DEFAULT_OUTPUT_NAME: &str = "idle_0";
pub const DEFAULT_KMEANS_ITERATIONS: u32 = 1;
pub const PREVIEW_PREFIX: &str = "PREVIEW_";

/// Largest palette a single-byte index can address
pub const MAX_PALETTE_SIZE: u16 = 256;

/// Palette-indexed raster produced by quantization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    pub width: u32,
    pub height: u32,
    pub palette: Vec<[u8; 4]>, // RGBA entries, at most 256
    pub indices: Vec<u8>,      // One palette index per pixel, row-major
}

impl IndexedImage {
    /// Build an indexed image, checking the pixel count and every index
    /// against the palette.
    pub fn new(
        width: u32,
        height: u32,
        palette: Vec<[u8; 4]>,
        indices: Vec<u8>,
    ) -> Result<Self, PixelArtError> {
        let expected = width as usize * height as usize;
        if indices.len() != expected {
            return Err(PixelArtError::QuantizationFailed {
                message: format!(
                    "index buffer has {} entries, expected {}×{} = {}",
                    indices.len(),
                    width,
                    height,
                    expected
                ),
            });
        }

        if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE as usize {
            return Err(PixelArtError::QuantizationFailed {
                message: format!("palette has {} colors (expected 1..=256)", palette.len()),
            });
        }

        if let Some(&bad) = indices.iter().find(|&&idx| idx as usize >= palette.len()) {
            return Err(PixelArtError::QuantizationFailed {
                message: format!(
                    "index {} out of range for palette of {} colors",
                    bad,
                    palette.len()
                ),
            });
        }

        Ok(Self {
            width,
            height,
            palette,
            indices,
        })
    }

    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    /// Number of palette entries actually referenced by a pixel
    pub fn colors_used(&self) -> usize {
        let mut used = [false; MAX_PALETTE_SIZE as usize];
        for &idx in &self.indices {
            used[idx as usize] = true;
        }
        used.iter().filter(|&&u| u).count()
    }

    /// Expand the palette into a direct four-channel buffer.
    pub fn to_rgba(&self) -> RgbaImage {
        let width = self.width as usize;
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let idx = self.indices[y as usize * width + x as usize];
            Rgba(self.palette[idx as usize])
        })
    }
}

/// Structured error taxonomy with stable codes
#[derive(Error, Debug)]
pub enum PixelArtError {
    #[error("E_INPUT_NOT_FOUND: could not find {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("E_DECODE: failed to decode {}: {message}", path.display())]
    DecodeFailed { path: PathBuf, message: String },

    #[error("E_UNSUPPORTED_FORMAT: unsupported image format for {}: {message}", path.display())]
    UnsupportedFormat { path: PathBuf, message: String },

    #[error("E_CONFIG: configuration invalid: {message}")]
    InvalidConfig { message: String },

    #[error("E_QUANTIZE: quantization failed: {message}")]
    QuantizationFailed { message: String },

    #[error("E_WRITE: failed to write {}: {message}", path.display())]
    WriteFailed { path: PathBuf, message: String },
}

impl PixelArtError {
    /// Get structured error code for logging
    pub fn code(&self) -> &'static str {
        match self {
            PixelArtError::InputNotFound { .. } => "E_INPUT_NOT_FOUND",
            PixelArtError::DecodeFailed { .. } => "E_DECODE",
            PixelArtError::UnsupportedFormat { .. } => "E_UNSUPPORTED_FORMAT",
            PixelArtError::InvalidConfig { .. } => "E_CONFIG",
            PixelArtError::QuantizationFailed { .. } => "E_QUANTIZE",
            PixelArtError::WriteFailed { .. } => "E_WRITE",
        }
    }

    /// Only a missing input is handled without failing the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PixelArtError::InputNotFound { .. })
    }
}
