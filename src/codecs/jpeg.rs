//! JPEG validation and normalisation.
//!
//! Source images are checked and re-encoded in two separate steps so a file
//! that cannot be decoded is reported differently from one that decoded but
//! could not be written back out.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{CocoRecordError, CocoRecordResult};

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Number of colour channels every stored and decoded image carries.
pub const CHANNELS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JpegCodec {
    #[serde(default = "default_quality")]
    pub quality: u8,
}

fn default_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl JpegCodec {
    pub fn new(quality: u8) -> CocoRecordResult<Self> {
        if !(1..=100).contains(&quality) {
            return Err(CocoRecordError::Config(format!(
                "JPEG quality must be within 1..=100, got {quality}"
            )));
        }
        Ok(Self { quality })
    }

    /// Validate `data` as a JPEG and re-encode it at this codec's quality.
    pub fn reencode(&self, data: &[u8]) -> CocoRecordResult<Vec<u8>> {
        let image = validate(data)?;
        normalize(&image, self.quality)
    }
}

/// Decode `data` as a JPEG, failing if it is anything else.
pub fn validate(data: &[u8]) -> CocoRecordResult<DynamicImage> {
    image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .map_err(|e| CocoRecordError::InvalidImage(format!("JPEG decode failed: {e}")))
}

/// Encode `image` as a 3-channel JPEG at `quality`.
pub fn normalize(image: &DynamicImage, quality: u8) -> CocoRecordResult<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(|e| CocoRecordError::ImageEncode(format!("JPEG encode failed: {e}")))?;
    Ok(out)
}

/// Decode stored JPEG bytes into RGB pixels, whatever channel layout the
/// stream itself declares.
pub fn decode_rgb(data: &[u8]) -> CocoRecordResult<RgbImage> {
    Ok(validate(data)?.to_rgb8())
}
