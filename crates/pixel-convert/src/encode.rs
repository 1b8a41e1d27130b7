use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use common_types::PixelArtError;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use tracing::info;

/// Write `image` as an RGBA8 PNG, returning the file size in bytes.
pub fn write_png(image: &RgbaImage, path: &Path) -> Result<u64, PixelArtError> {
    let write_failed = |message: String| PixelArtError::WriteFailed {
        path: path.to_path_buf(),
        message,
    };

    let file = File::create(path).map_err(|e| write_failed(e.to_string()))?;
    let mut writer = BufWriter::new(file);

    PngEncoder::new(&mut writer)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| write_failed(e.to_string()))?;

    writer.flush().map_err(|e| write_failed(e.to_string()))?;
    drop(writer);

    let file_size = std::fs::metadata(path)
        .map_err(|e| write_failed(e.to_string()))?
        .len();

    info!(
        stage = "encode",
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        bytes = file_size,
        "PNG written"
    );

    Ok(file_size)
}
