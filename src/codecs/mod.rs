pub mod gzip;
pub mod jpeg;
pub mod zlib;

use crate::error::{CocoRecordError, CocoRecordResult};
use flate2::read::{MultiGzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// CompressionId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionId {
    None,
    Gzip,
    Zlib,
}

impl std::fmt::Display for CompressionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionId::None => write!(f, "none"),
            CompressionId::Gzip => write!(f, "gzip"),
            CompressionId::Zlib => write!(f, "zlib"),
        }
    }
}

/// Map a compression name to its [`CompressionId`]. Matching is
/// case-insensitive so TensorFlow's `"GZIP"` / `"ZLIB"` / `""` are accepted.
pub fn lookup_compression_id(name: &str) -> Option<CompressionId> {
    match name.to_ascii_lowercase().as_str() {
        "" | "none" => Some(CompressionId::None),
        "gzip" => Some(CompressionId::Gzip),
        "zlib" => Some(CompressionId::Zlib),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Compression  (enum dispatch, no Box<dyn>)
// ---------------------------------------------------------------------------

/// Whole-file compression applied on top of the record framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "CompressionSpec", into = "CompressionSpec")]
pub enum Compression {
    #[default]
    None,
    Gzip(gzip::GzipCodec),
    Zlib(zlib::ZlibCodec),
}

impl Compression {
    pub fn compression_id(&self) -> CompressionId {
        match self {
            Compression::None => CompressionId::None,
            Compression::Gzip(_) => CompressionId::Gzip,
            Compression::Zlib(_) => CompressionId::Zlib,
        }
    }

    pub fn from_id(id: CompressionId) -> Self {
        match id {
            CompressionId::None => Compression::None,
            CompressionId::Gzip => Compression::Gzip(gzip::GzipCodec::default()),
            CompressionId::Zlib => Compression::Zlib(zlib::ZlibCodec::default()),
        }
    }

    pub fn writer<W: Write>(&self, inner: W) -> CompressedWriter<W> {
        match self {
            Compression::None => CompressedWriter::Plain(inner),
            Compression::Gzip(c) => CompressedWriter::Gzip(c.writer(inner)),
            Compression::Zlib(c) => CompressedWriter::Zlib(c.writer(inner)),
        }
    }

    pub fn reader<R: Read>(&self, inner: R) -> CompressedReader<R> {
        match self {
            Compression::None => CompressedReader::Plain(inner),
            Compression::Gzip(c) => CompressedReader::Gzip(c.reader(inner)),
            Compression::Zlib(c) => CompressedReader::Zlib(c.reader(inner)),
        }
    }
}

impl FromStr for Compression {
    type Err = CocoRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_compression_id(s)
            .map(Compression::from_id)
            .ok_or_else(|| CocoRecordError::Config(format!("Unknown compression: {s}")))
    }
}

// ---------------------------------------------------------------------------
// JSON form
// ---------------------------------------------------------------------------

/// Either a bare name (`"gzip"`) or `{ "name": ..., "configuration": ... }`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
enum CompressionSpec {
    Name(String),
    Envelope {
        name: String,
        #[serde(default)]
        configuration: Option<serde_json::Value>,
    },
}

impl TryFrom<CompressionSpec> for Compression {
    type Error = CocoRecordError;

    fn try_from(spec: CompressionSpec) -> CocoRecordResult<Self> {
        let (name, configuration) = match spec {
            CompressionSpec::Name(name) => (name, None),
            CompressionSpec::Envelope {
                name,
                configuration,
            } => (name, configuration),
        };
        let id = lookup_compression_id(&name)
            .ok_or_else(|| CocoRecordError::Config(format!("Unknown compression: {name}")))?;
        let Some(config) = configuration else {
            return Ok(Compression::from_id(id));
        };
        match id {
            CompressionId::None => Ok(Compression::None),
            CompressionId::Gzip => Ok(Compression::Gzip(serde_json::from_value(config)?)),
            CompressionId::Zlib => Ok(Compression::Zlib(serde_json::from_value(config)?)),
        }
    }
}

impl From<Compression> for CompressionSpec {
    fn from(compression: Compression) -> Self {
        let configuration = match compression {
            Compression::None => None,
            Compression::Gzip(c) => serde_json::to_value(c).ok(),
            Compression::Zlib(c) => serde_json::to_value(c).ok(),
        };
        CompressionSpec::Envelope {
            name: compression.compression_id().to_string(),
            configuration,
        }
    }
}

// ---------------------------------------------------------------------------
// Stream wrappers
// ---------------------------------------------------------------------------

pub enum CompressedWriter<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
    Zlib(ZlibEncoder<W>),
}

impl<W: Write> CompressedWriter<W> {
    /// Write any trailer and hand back the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            CompressedWriter::Plain(w) => Ok(w),
            CompressedWriter::Gzip(e) => e.finish(),
            CompressedWriter::Zlib(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for CompressedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            CompressedWriter::Plain(w) => w.write(buf),
            CompressedWriter::Gzip(e) => e.write(buf),
            CompressedWriter::Zlib(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            CompressedWriter::Plain(w) => w.flush(),
            CompressedWriter::Gzip(e) => e.flush(),
            CompressedWriter::Zlib(e) => e.flush(),
        }
    }
}

pub enum CompressedReader<R: Read> {
    Plain(R),
    Gzip(MultiGzDecoder<R>),
    Zlib(ZlibDecoder<R>),
}

impl<R: Read> Read for CompressedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            CompressedReader::Plain(r) => r.read(buf),
            CompressedReader::Gzip(d) => d.read(buf),
            CompressedReader::Zlib(d) => d.read(buf),
        }
    }
}
