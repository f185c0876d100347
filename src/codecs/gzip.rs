use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GzipCodec {
    #[serde(default = "default_level")]
    pub level: u32,
}

fn default_level() -> u32 {
    6
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl GzipCodec {
    pub fn writer<W: Write>(&self, inner: W) -> GzEncoder<W> {
        GzEncoder::new(inner, Compression::new(self.level.min(9)))
    }

    /// Concatenated gzip members are read as one stream.
    pub fn reader<R: Read>(&self, inner: R) -> MultiGzDecoder<R> {
        MultiGzDecoder::new(inner)
    }
}
