//! Annotations + images → shard files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use log::{debug, info, trace, warn};
use tfrecord::BytesWriter;

use crate::annotations::Annotation;
use crate::codecs::Compression;
use crate::codecs::jpeg::{self, JpegCodec};
use crate::config::EncoderConfig;
use crate::error::{CocoRecordError, CocoRecordResult};
use crate::schema::EncodedRecord;
use crate::shard::{ShardSpec, plan_shards};
use crate::store::ImageSource;

/// What was written for one shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardSummary {
    pub index: usize,
    pub path: PathBuf,
    pub count: usize,
}

/// Fetch, validate and normalise the image for `annotation`, and pack it
/// with the annotation's fields.
pub fn encode_record<S: ImageSource + ?Sized>(
    annotation: &Annotation,
    source: &S,
    codec: &JpegCodec,
) -> CocoRecordResult<EncodedRecord> {
    let location = source.locate(annotation.image_id)?;
    let raw = source
        .get(annotation.image_id)?
        .ok_or_else(|| CocoRecordError::ImageNotFound(location.clone()))?;

    let decoded = jpeg::validate(&raw).map_err(|e| match e {
        CocoRecordError::InvalidImage(msg) => {
            CocoRecordError::InvalidImage(format!("{location}: {msg}"))
        }
        other => other,
    })?;
    let normalized = jpeg::normalize(&decoded, codec.quality)?;

    trace!(
        "Annotation {} -> {} ({} bytes)",
        annotation.id,
        location,
        normalized.len()
    );
    Ok(EncodedRecord::from_annotation(
        annotation,
        location,
        Bytes::from(normalized),
    ))
}

/// Write one shard's annotations to `path`.
///
/// The file is removed again if anything fails, so a shard name on disk
/// always matches the records inside it.
pub fn write_shard<S: ImageSource + ?Sized>(
    path: &Path,
    annotations: &[Annotation],
    source: &S,
    codec: &JpegCodec,
    compression: &Compression,
) -> CocoRecordResult<usize> {
    let result = write_shard_file(path, annotations, source, codec, compression);
    if result.is_err() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove partial shard {}: {e}", path.display());
        }
    }
    result
}

fn write_shard_file<S: ImageSource + ?Sized>(
    path: &Path,
    annotations: &[Annotation],
    source: &S,
    codec: &JpegCodec,
    compression: &Compression,
) -> CocoRecordResult<usize> {
    let file = File::create(path)?;
    let mut compressed = compression.writer(BufWriter::new(file));
    let mut records = BytesWriter::from_writer(&mut compressed)?;
    for annotation in annotations {
        let record = encode_record(annotation, source, codec)?;
        records.send(record.encode()?)?;
    }
    records.flush()?;

    let mut buffered = compressed.finish()?;
    buffered.flush()?;
    Ok(annotations.len())
}

/// Convert `annotations` into `ceil(len / num_samples)` shard files under
/// `config.output_dir`.
///
/// Shards are written in order and the first error aborts the run.
pub fn encode_dataset<S: ImageSource + ?Sized>(
    config: &EncoderConfig,
    annotations: &[Annotation],
    source: &S,
) -> CocoRecordResult<Vec<ShardSummary>> {
    config.validate()?;
    let codec = config.jpeg_codec()?;
    let plan = plan_shards(annotations.len(), config.num_samples)?;

    std::fs::create_dir_all(&config.output_dir)?;
    info!(
        "Encoding {} annotations into {} shard(s) in {}",
        annotations.len(),
        plan.len(),
        config.output_dir.display()
    );

    let mut summaries = Vec::with_capacity(plan.len());
    for spec in &plan {
        summaries.push(encode_shard(config, spec, annotations, source, &codec)?);
    }
    Ok(summaries)
}

fn encode_shard<S: ImageSource + ?Sized>(
    config: &EncoderConfig,
    spec: &ShardSpec,
    annotations: &[Annotation],
    source: &S,
    codec: &JpegCodec,
) -> CocoRecordResult<ShardSummary> {
    let path = config.output_dir.join(spec.file_name(&config.extension));
    debug!(
        "Shard {}: records {}..{}",
        spec.index, spec.range.start, spec.range.end
    );

    let count = write_shard(
        &path,
        &annotations[spec.range.clone()],
        source,
        codec,
        &config.compression,
    )?;
    info!("Wrote {} ({count} records)", path.display());

    Ok(ShardSummary {
        index: spec.index,
        path,
        count,
    })
}
