//! Loading source images and shrinking them to fit inside a QR payload.

use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Quality of the first JPEG attempt.
pub const START_QUALITY: u8 = 85;

/// Quality lost on every retry.
pub const QUALITY_STEP: u8 = 15;

/// Lowest quality tried; the result at this level is accepted whatever its size.
pub const MIN_QUALITY: u8 = 10;

/// Size budget for plain image payloads, in KB.
pub const IMAGE_MAX_KB: usize = 500;

/// Size budget for encrypted image payloads, in KB.
pub const ENCRYPTED_IMAGE_MAX_KB: usize = 300;

/// Prefix of the data URI wrapping an embedded JPEG.
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// A JPEG produced by [`recompress`] together with the quality that was kept.
#[derive(Debug, Clone)]
pub struct Recompressed {
    pub bytes: Vec<u8>,
    pub quality: u8,
}

impl Recompressed {
    /// Size in whole kilobytes, rounded down.
    pub fn size_kb(&self) -> usize {
        self.bytes.len() / 1024
    }
}

/// Flattens any transparency onto a white background and drops the alpha channel.
pub fn flatten_to_rgb(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| -> u8 {
            let a = a as u32;
            ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8
        };
        *pixel = Rgb([blend(r), blend(g), blend(b)]);
    }
    out
}

/// Runs the quality ladder: encode at 85, 70, 55, ... and keep the first
/// result whose size in whole KB is at most `max_size_kb`, or the one at the
/// floor quality.
pub fn recompress<F>(mut encode_at: F, max_size_kb: usize) -> Result<Recompressed>
where
    F: FnMut(u8) -> Result<Vec<u8>>,
{
    let mut quality = START_QUALITY;
    loop {
        let bytes = encode_at(quality)?;
        let attempt = Recompressed { bytes, quality };
        debug!(quality, size_kb = attempt.size_kb(), max_size_kb, "jpeg attempt");
        if attempt.size_kb() <= max_size_kb || quality <= MIN_QUALITY {
            return Ok(attempt);
        }
        quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
    }
}

/// Encodes `img` as a baseline JPEG at the given quality.
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    img.write_with_encoder(encoder)?;
    Ok(buffer.into_inner())
}

/// Loads the image at `path`, flattens it to opaque RGB and recompresses it
/// as JPEG until it fits in `max_size_kb`.
///
/// # Errors
///
/// [`Error::NotFound`] if `path` does not exist, [`Error::Image`] if it cannot
/// be decoded.
pub fn load_and_recompress_image(path: &Path, max_size_kb: usize) -> Result<Recompressed> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    let rgb = flatten_to_rgb(image::open(path)?);
    let result = recompress(|quality| encode_jpeg(&rgb, quality), max_size_kb)?;
    info!(
        path = %path.display(),
        size_kb = result.size_kb(),
        quality = result.quality,
        "image recompressed"
    );
    Ok(result)
}

/// Wraps JPEG bytes as `data:image/jpeg;base64,...`.
pub fn to_data_uri(jpeg: &[u8]) -> String {
    format!("{JPEG_DATA_URI_PREFIX}{}", STANDARD.encode(jpeg))
}

/// Extracts the JPEG bytes from a URI made by [`to_data_uri`].
pub fn from_data_uri(uri: &str) -> Result<Vec<u8>> {
    let encoded = uri
        .strip_prefix(JPEG_DATA_URI_PREFIX)
        .ok_or_else(|| Error::Validation("not a JPEG data URI".to_string()))?;
    STANDARD
        .decode(encoded)
        .map_err(|e| Error::Validation(format!("invalid base64 in data URI: {e}")))
}
