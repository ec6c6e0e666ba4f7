use image::{ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;

use crate::error::DecodeError;

/// A decoded image reduced to 8-bit RGB, alpha dropped.
pub struct DecodedImage {
    pub pixels: RgbImage,
    pub format: ImageFormat,
}

impl DecodedImage {
    /// Lowercase format name, e.g. "png"
    pub fn format_name(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("unknown")
    }
}

/// Decode image bytes, sniffing the format from the content rather than the URL.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let format = reader.format().ok_or(DecodeError::UnsupportedFormat)?;
    let image = reader.decode()?;

    Ok(DecodedImage {
        pixels: image.into_rgb8(),
        format,
    })
}

/// Run [`decode`] on the blocking pool.
pub async fn decode_blocking(bytes: Vec<u8>) -> Result<DecodedImage, DecodeError> {
    tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .map_err(|e| DecodeError::TaskFailed(e.to_string()))?
}
