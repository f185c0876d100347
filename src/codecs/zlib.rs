use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZlibCodec {
    #[serde(default = "default_level")]
    pub level: u32,
}

fn default_level() -> u32 {
    6
}

impl Default for ZlibCodec {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl ZlibCodec {
    pub fn writer<W: Write>(&self, inner: W) -> ZlibEncoder<W> {
        ZlibEncoder::new(inner, Compression::new(self.level.min(9)))
    }

    pub fn reader<R: Read>(&self, inner: R) -> ZlibDecoder<R> {
        ZlibDecoder::new(inner)
    }
}
