//! Shard file → decoded samples.
//!
//! Readers are lazy and single-pass over the file. To start over, open the
//! shard again.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::debug;
use tfrecord::{ExampleIter, RecordReaderConfig};

use crate::codecs::CompressedReader;
use crate::config::DecoderConfig;
use crate::error::{CocoRecordError, CocoRecordResult};
use crate::schema::{EncodedRecord, Sample};

pub type FileRecords = RecordStream<CompressedReader<BufReader<File>>>;
pub type FileShardReader = ShardReader<CompressedReader<BufReader<File>>>;

// ---------------------------------------------------------------------------
// RecordStream
// ---------------------------------------------------------------------------

/// Schema-checked records, image left as JPEG bytes.
pub struct RecordStream<R: Read> {
    records: ExampleIter<R>,
    done: bool,
}

impl<R: Read> RecordStream<R> {
    pub fn new(reader: R, verify_checksums: bool) -> Self {
        let config = RecordReaderConfig {
            check_integrity: verify_checksums,
        };
        Self {
            records: ExampleIter::from_reader(reader, config),
            done: false,
        }
    }
}

impl<R: Read> Iterator for RecordStream<R> {
    type Item = CocoRecordResult<EncodedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self
            .records
            .next()?
            .map_err(CocoRecordError::from)
            .and_then(EncodedRecord::from_example);
        self.done = result.is_err();
        Some(result)
    }
}

// ---------------------------------------------------------------------------
// ShardReader
// ---------------------------------------------------------------------------

/// Fully decoded samples with RGB images.
pub struct ShardReader<R: Read> {
    records: RecordStream<R>,
    done: bool,
}

impl<R: Read> ShardReader<R> {
    pub fn new(reader: R, verify_checksums: bool) -> Self {
        Self {
            records: RecordStream::new(reader, verify_checksums),
            done: false,
        }
    }
}

impl<R: Read> Iterator for ShardReader<R> {
    type Item = CocoRecordResult<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.records.next()?.and_then(Sample::from_record);
        self.done = result.is_err();
        Some(result)
    }
}

// ---------------------------------------------------------------------------
// File entry points
// ---------------------------------------------------------------------------

fn open_file(
    path: &Path,
    config: &DecoderConfig,
) -> CocoRecordResult<CompressedReader<BufReader<File>>> {
    let file = File::open(path)?;
    debug!(
        "Opening shard {} (compression: {})",
        path.display(),
        config.compression.compression_id()
    );
    Ok(config.compression.reader(BufReader::new(file)))
}

/// Open a shard for raw record access.
pub fn read_shard_records(
    path: impl AsRef<Path>,
    config: &DecoderConfig,
) -> CocoRecordResult<FileRecords> {
    let reader = open_file(path.as_ref(), config)?;
    Ok(RecordStream::new(reader, config.verify_checksums))
}

/// Open a shard for decoding into samples.
pub fn open_shard(
    path: impl AsRef<Path>,
    config: &DecoderConfig,
) -> CocoRecordResult<FileShardReader> {
    let reader = open_file(path.as_ref(), config)?;
    Ok(ShardReader::new(reader, config.verify_checksums))
}

/// The first `k` samples of a shard, in file order.
pub fn take(
    path: impl AsRef<Path>,
    k: usize,
    config: &DecoderConfig,
) -> CocoRecordResult<Vec<Sample>> {
    open_shard(path, config)?.take(k).collect()
}
