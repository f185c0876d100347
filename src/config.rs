//! Encoder and decoder parameters.
//!
//! Every run takes its settings explicitly, so conversions with different
//! parameters can share a process.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codecs::Compression;
use crate::codecs::jpeg::{DEFAULT_JPEG_QUALITY, JpegCodec};
use crate::error::{CocoRecordError, CocoRecordResult};

pub const DEFAULT_NUM_SAMPLES: usize = 4096;
pub const DEFAULT_EXTENSION: &str = "tfrec";

pub const DEFAULT_DATASET_ROOT: &str = "./datasets";
pub const DEFAULT_OUTPUT_DIR: &str = "./tfrecords";
pub const IMAGES_SUBDIR: &str = "val2017";
pub const ANNOTATIONS_SUBDIR: &str = "annotations";
pub const ANNOTATIONS_FILE: &str = "instances_val2017.json";

// ---------------------------------------------------------------------------
// EncoderConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub images_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub compression: Compression,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_num_samples() -> usize {
    DEFAULT_NUM_SAMPLES
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            images_dir: dataset_images_dir(DEFAULT_DATASET_ROOT),
            output_dir: default_output_dir(),
            num_samples: DEFAULT_NUM_SAMPLES,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            extension: default_extension(),
            compression: Compression::None,
        }
    }
}

impl EncoderConfig {
    pub fn new(images_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> CocoRecordResult<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CocoRecordResult<()> {
        if self.num_samples == 0 {
            return Err(CocoRecordError::Config(
                "num_samples must be greater than zero".into(),
            ));
        }
        if self.extension.is_empty() || self.extension.contains(['/', '\\']) {
            return Err(CocoRecordError::Config(format!(
                "Invalid shard extension: {:?}",
                self.extension
            )));
        }
        self.jpeg_codec().map(|_| ())
    }

    pub fn jpeg_codec(&self) -> CocoRecordResult<JpegCodec> {
        JpegCodec::new(self.jpeg_quality)
    }
}

// ---------------------------------------------------------------------------
// DecoderConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    #[serde(default)]
    pub compression: Compression,
    #[serde(default = "default_verify_checksums")]
    pub verify_checksums: bool,
}

fn default_verify_checksums() -> bool {
    true
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            compression: Compression::None,
            verify_checksums: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset layout
// ---------------------------------------------------------------------------

/// `<root>/val2017`
pub fn dataset_images_dir(root: impl AsRef<Path>) -> PathBuf {
    root.as_ref().join(IMAGES_SUBDIR)
}

/// `<root>/annotations/instances_val2017.json`
pub fn dataset_annotations_file(root: impl AsRef<Path>) -> PathBuf {
    root.as_ref().join(ANNOTATIONS_SUBDIR).join(ANNOTATIONS_FILE)
}
