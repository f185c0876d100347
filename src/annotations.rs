//! COCO instance annotations.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::CocoRecordResult;

/// One object annotation from a COCO `instances_*.json` document.
///
/// Keys not listed here (`segmentation`, `iscrowd`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub area: f64,
    pub bbox: Vec<f64>,
    pub category_id: i64,
    pub id: i64,
    pub image_id: i64,
}

#[derive(Debug, Deserialize)]
struct InstancesDocument {
    annotations: Vec<Annotation>,
}

/// Parse the `annotations` array out of an instances document.
pub fn parse_annotations(json: &str) -> CocoRecordResult<Vec<Annotation>> {
    let doc: InstancesDocument = serde_json::from_str(json)?;
    Ok(doc.annotations)
}

/// Load the `annotations` array from an instances file on disk.
pub fn load_annotations(path: impl AsRef<Path>) -> CocoRecordResult<Vec<Annotation>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let doc: InstancesDocument = serde_json::from_reader(reader)?;
    info!(
        "Loaded {} annotations from {}",
        doc.annotations.len(),
        path.display()
    );
    Ok(doc.annotations)
}
