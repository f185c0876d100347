use crate::error::{CocoRecordError, CocoRecordResult};
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File name COCO uses for an image: the id zero-padded to 12 digits.
pub fn image_file_name(image_id: i64) -> String {
    format!("{image_id:012}.jpg")
}

// ---------------------------------------------------------------------------
// ImageSource trait
// ---------------------------------------------------------------------------

/// Where the encoder fetches source images from.
pub trait ImageSource {
    /// Location of the image, stored in the record's `path`.
    fn locate(&self, image_id: i64) -> CocoRecordResult<String>;

    /// Fetch the raw bytes for `image_id`.
    /// Returns `Ok(None)` when the image does not exist (rather than an error).
    fn get(&self, image_id: i64) -> CocoRecordResult<Option<Bytes>>;
}

// ---------------------------------------------------------------------------
// LocalImageDir  (std::fs)
// ---------------------------------------------------------------------------

/// A directory of `<image_id:012>.jpg` files.
#[derive(Debug, Clone)]
pub struct LocalImageDir {
    root: PathBuf,
}

impl LocalImageDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, image_id: i64) -> PathBuf {
        self.root.join(image_file_name(image_id))
    }
}

impl ImageSource for LocalImageDir {
    /// Fails with [`CocoRecordError::Config`] if the path is not UTF-8.
    fn locate(&self, image_id: i64) -> CocoRecordResult<String> {
        let full = self.resolve(image_id);
        full.to_str().map(str::to_owned).ok_or_else(|| {
            CocoRecordError::Config(format!(
                "Image path is not valid UTF-8: {}",
                full.display()
            ))
        })
    }

    fn get(&self, image_id: i64) -> CocoRecordResult<Option<Bytes>> {
        let full = self.resolve(image_id);
        match std::fs::read(&full) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CocoRecordError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {e}", full.display()),
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// InMemoryImages
// ---------------------------------------------------------------------------

/// Images held in memory, keyed by image id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryImages {
    prefix: String,
    images: HashMap<i64, Bytes>,
}

impl InMemoryImages {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            images: HashMap::new(),
        }
    }

    pub fn insert(&mut self, image_id: i64, data: impl Into<Bytes>) {
        self.images.insert(image_id, data.into());
    }
}

impl ImageSource for InMemoryImages {
    fn locate(&self, image_id: i64) -> CocoRecordResult<String> {
        if self.prefix.is_empty() {
            Ok(image_file_name(image_id))
        } else {
            Ok(format!("{}/{}", self.prefix, image_file_name(image_id)))
        }
    }

    fn get(&self, image_id: i64) -> CocoRecordResult<Option<Bytes>> {
        Ok(self.images.get(&image_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_zero_padded() {
        assert_eq!(image_file_name(139), "000000000139.jpg");
        assert_eq!(image_file_name(581_781), "000000581781.jpg");
    }

    #[test]
    fn local_dir_reports_missing_as_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = LocalImageDir::new(dir.path());
        assert!(source.get(1).unwrap().is_none());

        std::fs::write(source.resolve(1), b"bytes").unwrap();
        assert_eq!(source.get(1).unwrap().unwrap(), Bytes::from_static(b"bytes"));
        assert!(source.locate(1).unwrap().ends_with("000000000001.jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_root_cannot_be_located() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let source = LocalImageDir::new(Path::new(OsStr::from_bytes(b"imgs-\xff")));
        assert!(matches!(
            source.locate(1),
            Err(CocoRecordError::Config(msg)) if msg.contains("000000000001.jpg")
        ));
    }

    #[test]
    fn in_memory_source() {
        let mut source = InMemoryImages::new("mem");
        source.insert(7, vec![1u8, 2, 3]);
        assert_eq!(source.locate(7).unwrap(), "mem/000000000007.jpg");
        assert_eq!(source.get(7).unwrap().unwrap().len(), 3);
        assert!(source.get(8).unwrap().is_none());
    }
}
