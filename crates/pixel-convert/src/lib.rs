use std::path::{Path, PathBuf};
use std::time::Instant;

use common_types::{
    PixelArtError, DEFAULT_KMEANS_ITERATIONS, DEFAULT_MAX_COLORS, DEFAULT_OUTPUT_NAME,
    DEFAULT_PREVIEW_SIZE, DEFAULT_TARGET_SIZE, MAX_PALETTE_SIZE, PREVIEW_PREFIX,
};
use image::ColorType;
use palette_quant::{QuantizeStrategy, Quantizer};
use tracing::info;

pub mod encode;
pub mod load;
pub mod resample;

pub use encode::write_png;
pub use load::load_image;
pub use resample::{resample_nearest, resize_nearest};

/// Conversion settings. Defaults produce `idle_0.png` (80×80, at most 64
/// colors) and `PREVIEW_idle_0.png` (512×512) in the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    pub output_name: String,
    pub target_size: (u32, u32),
    pub max_colors: u16,
    pub preview_size: (u32, u32),
    pub kmeans_iterations: u32,
    pub output_dir: PathBuf, // Empty path means the working directory
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            target_size: DEFAULT_TARGET_SIZE,
            max_colors: DEFAULT_MAX_COLORS,
            preview_size: DEFAULT_PREVIEW_SIZE,
            kmeans_iterations: DEFAULT_KMEANS_ITERATIONS,
            output_dir: PathBuf::new(),
        }
    }
}

impl ConvertConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    pub fn with_target_size(mut self, width: u32, height: u32) -> Self {
        self.target_size = (width, height);
        self
    }

    pub fn with_max_colors(mut self, max_colors: u16) -> Self {
        self.max_colors = max_colors;
        self
    }

    pub fn with_preview_size(mut self, width: u32, height: u32) -> Self {
        self.preview_size = (width, height);
        self
    }

    pub fn with_kmeans_iterations(mut self, iterations: u32) -> Self {
        self.kmeans_iterations = iterations;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn validate(&self) -> Result<(), PixelArtError> {
        let invalid = |message: String| Err(PixelArtError::InvalidConfig { message });

        if self.target_size.0 == 0 || self.target_size.1 == 0 {
            return invalid(format!(
                "target size must be positive, got {}×{}",
                self.target_size.0, self.target_size.1
            ));
        }
        if self.preview_size.0 == 0 || self.preview_size.1 == 0 {
            return invalid(format!(
                "preview size must be positive, got {}×{}",
                self.preview_size.0, self.preview_size.1
            ));
        }
        if self.max_colors == 0 || self.max_colors > MAX_PALETTE_SIZE {
            return invalid(format!(
                "max_colors must be in 1..={}, got {}",
                MAX_PALETTE_SIZE, self.max_colors
            ));
        }
        if self.output_name.is_empty()
            || self.output_name == "."
            || self.output_name == ".."
            || self.output_name.contains(['/', '\\'])
        {
            return invalid(format!("invalid output name {:?}", self.output_name));
        }

        Ok(())
    }

    /// `{output_dir}/{output_name}.png`
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.png", self.output_name))
    }

    /// `{output_dir}/PREVIEW_{output_name}.png`
    pub fn preview_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}{}.png", PREVIEW_PREFIX, self.output_name))
    }
}

/// What one successful conversion produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub output_path: PathBuf,
    pub preview_path: PathBuf,
    pub source_size: (u32, u32),
    pub source_color: ColorType,
    pub small_size: (u32, u32),
    pub preview_size: (u32, u32),
    pub palette_size: usize,
    pub strategy: QuantizeStrategy,
}

/// Convert the image at `input_path` into a pixel art PNG plus an upscaled
/// preview.
///
/// Nothing is written unless the input decodes; a missing input comes back
/// as [`PixelArtError::InputNotFound`].
#[tracing::instrument(level = "info", skip(input_path, config), fields(input = %input_path.display()))]
pub fn convert(input_path: &Path, config: &ConvertConfig) -> Result<ConversionReport, PixelArtError> {
    config.validate()?;
    let start_time = Instant::now();

    // Step 1: Load
    let source = load::load_image(input_path)?;
    let source_size = (source.width(), source.height());
    let source_color = source.color();

    // Step 2: Resize (nearest neighbor only)
    let (width, height) = config.target_size;
    let small = resample::resize_nearest(&source, width, height);
    drop(source);
    info!(
        stage = "resize",
        from = ?source_size,
        to = ?config.target_size,
        "Downsized with nearest neighbor"
    );

    // Step 3: Quantize, strategy picked from the channel layout
    let quantizer = Quantizer::for_color_type(small.color(), config.max_colors as usize)
        .with_kmeans_iterations(config.kmeans_iterations);
    let quantized = quantizer.quantize(&small.to_rgba8())?;

    // Step 4: Normalize to direct RGBA
    let result = quantized.to_rgba();

    // Step 5: Save
    let output_path = config.output_path();
    encode::write_png(&result, &output_path)?;

    // Steps 6-7: Preview
    let (preview_w, preview_h) = config.preview_size;
    let preview = resample::resample_nearest(&result, preview_w, preview_h);
    let preview_path = config.preview_path();
    encode::write_png(&preview, &preview_path)?;

    info!(
        duration_ms = start_time.elapsed().as_millis() as u64,
        strategy = %quantizer.strategy(),
        palette_size = quantized.palette_len(),
        "Conversion completed"
    );

    Ok(ConversionReport {
        output_path,
        preview_path,
        source_size,
        source_color,
        small_size: config.target_size,
        preview_size: config.preview_size,
        palette_size: quantized.palette_len(),
        strategy: quantizer.strategy(),
    })
}
