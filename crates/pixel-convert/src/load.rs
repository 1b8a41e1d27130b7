use std::io::ErrorKind;
use std::path::Path;

use common_types::PixelArtError;
use image::{DynamicImage, ImageError, ImageReader};
use tracing::{debug, info};

/// Decode the image at `path`.
///
/// A path that is not a readable regular file is `InputNotFound`; anything
/// the decoder rejects is `UnsupportedFormat` or `DecodeFailed`.
pub fn load_image(path: &Path) -> Result<DynamicImage, PixelArtError> {
    if !path.is_file() {
        return Err(PixelArtError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let reader = ImageReader::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => PixelArtError::InputNotFound {
            path: path.to_path_buf(),
        },
        _ => PixelArtError::DecodeFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    })?;

    // Magic bytes first, extension as fallback
    let reader = reader
        .with_guessed_format()
        .map_err(|e| PixelArtError::DecodeFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    debug!(stage = "load", format = ?reader.format(), "Detected format");

    let image = reader.decode().map_err(|e| classify_decode_error(path, e))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(PixelArtError::DecodeFailed {
            path: path.to_path_buf(),
            message: "image has no pixels".to_string(),
        });
    }

    info!(
        stage = "load",
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "Decoded source image"
    );

    Ok(image)
}

fn classify_decode_error(path: &Path, err: ImageError) -> PixelArtError {
    match err {
        ImageError::Unsupported(e) => PixelArtError::UnsupportedFormat {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
        other => PixelArtError::DecodeFailed {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    }
}
