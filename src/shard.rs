//! Shard partitioning and file naming.

use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::error::{CocoRecordError, CocoRecordResult};

/// One contiguous window of the input list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardSpec {
    pub index: usize,
    pub range: Range<usize>,
}

impl ShardSpec {
    pub fn count(&self) -> usize {
        self.range.len()
    }

    pub fn file_name(&self, extension: &str) -> String {
        shard_file_name(self.index, self.count(), extension)
    }
}

/// Number of shards needed for `total` records, `num_samples` per shard.
pub fn shard_count(total: usize, num_samples: usize) -> usize {
    total.div_ceil(num_samples)
}

/// Split `0..total` into windows of `num_samples`; the last may be shorter.
pub fn plan_shards(total: usize, num_samples: usize) -> CocoRecordResult<Vec<ShardSpec>> {
    if num_samples == 0 {
        return Err(CocoRecordError::Config(
            "num_samples must be greater than zero".into(),
        ));
    }
    Ok((0..shard_count(total, num_samples))
        .map(|index| {
            let start = index * num_samples;
            let end = (start + num_samples).min(total);
            ShardSpec {
                index,
                range: start..end,
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// `file_<index, 2+ digits>-<count>.<extension>`
pub fn shard_file_name(index: usize, count: usize, extension: &str) -> String {
    format!("file_{index:02}-{count}.{extension}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardName {
    pub index: usize,
    pub count: usize,
    pub extension: String,
}

/// Parse a name produced by [`shard_file_name`].
pub fn parse_shard_file_name(name: &str) -> Option<ShardName> {
    let rest = name.strip_prefix("file_")?;
    let (stem, extension) = rest.split_once('.')?;
    let (index, count) = stem.split_once('-')?;
    if index.len() < 2 || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(ShardName {
        index: index.parse().ok()?,
        count: count.parse().ok()?,
        extension: extension.to_string(),
    })
}

/// Shard files in `dir` with the given extension, ordered by index.
pub fn list_shards(dir: impl AsRef<Path>, extension: &str) -> CocoRecordResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().and_then(parse_shard_file_name) else {
            continue;
        };
        if name.extension == extension {
            found.push((name.index, entry.path()));
        }
    }
    found.sort_by_key(|(index, _)| *index);
    Ok(found.into_iter().map(|(_, path)| path).collect())
}
