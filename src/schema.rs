//! The fixed seven-field record schema, mapped onto `tf.train.Example`.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use image::RgbImage;
use tfrecord::{Example, Feature, Record};

use crate::annotations::Annotation;
use crate::codecs::jpeg::{self, CHANNELS};
use crate::error::{CocoRecordError, CocoRecordResult};

pub const FIELD_IMAGE: &str = "image";
pub const FIELD_PATH: &str = "path";
pub const FIELD_AREA: &str = "area";
pub const FIELD_BBOX: &str = "bbox";
pub const FIELD_CATEGORY_ID: &str = "category_id";
pub const FIELD_ID: &str = "id";
pub const FIELD_IMAGE_ID: &str = "image_id";

/// Which value list a feature holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bytes,
    Float,
    Int64,
}

impl ValueKind {
    /// `None` for a feature with no value list at all.
    pub fn of(feature: &Feature) -> Option<Self> {
        if feature.as_bytes_list().is_some() {
            Some(ValueKind::Bytes)
        } else if feature.as_f32_list().is_some() {
            Some(ValueKind::Float)
        } else if feature.as_i64_list().is_some() {
            Some(ValueKind::Int64)
        } else {
            None
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Bytes => write!(f, "bytes_list"),
            ValueKind::Float => write!(f, "float_list"),
            ValueKind::Int64 => write!(f, "int64_list"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one value.
    Scalar,
    /// Any number of values.
    Variable,
}

/// Every field a record carries, in on-disk order.
pub const SCHEMA: [(&str, ValueKind, Arity); 7] = [
    (FIELD_IMAGE, ValueKind::Bytes, Arity::Scalar),
    (FIELD_PATH, ValueKind::Bytes, Arity::Scalar),
    (FIELD_AREA, ValueKind::Float, Arity::Scalar),
    (FIELD_BBOX, ValueKind::Float, Arity::Variable),
    (FIELD_CATEGORY_ID, ValueKind::Int64, Arity::Scalar),
    (FIELD_ID, ValueKind::Int64, Arity::Scalar),
    (FIELD_IMAGE_ID, ValueKind::Int64, Arity::Scalar),
];

// ---------------------------------------------------------------------------
// EncodedRecord
// ---------------------------------------------------------------------------

/// A record as stored in a shard: the image still JPEG-encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    pub image: Bytes,
    pub path: String,
    pub area: f32,
    pub bbox: Vec<f32>,
    pub category_id: i64,
    pub id: i64,
    pub image_id: i64,
}

impl EncodedRecord {
    /// Build a record from an annotation and its already-normalised JPEG.
    pub fn from_annotation(annotation: &Annotation, path: impl Into<String>, image: Bytes) -> Self {
        Self {
            image,
            path: path.into(),
            area: annotation.area as f32,
            bbox: annotation.bbox.iter().map(|v| *v as f32).collect(),
            category_id: annotation.category_id,
            id: annotation.id,
            image_id: annotation.image_id,
        }
    }

    /// Named features in [`SCHEMA`] order.
    pub fn features(&self) -> [(&'static str, Feature); 7] {
        [
            (FIELD_IMAGE, Feature::from_bytes_iter([self.image.to_vec()])),
            (FIELD_PATH, Feature::from_bytes_iter([self.path.as_bytes().to_vec()])),
            (FIELD_AREA, Feature::from_f32_list(vec![self.area])),
            (FIELD_BBOX, Feature::from_f32_list(self.bbox.as_slice())),
            (FIELD_CATEGORY_ID, Feature::from_i64_list(vec![self.category_id])),
            (FIELD_ID, Feature::from_i64_list(vec![self.id])),
            (FIELD_IMAGE_ID, Feature::from_i64_list(vec![self.image_id])),
        ]
    }

    pub fn to_example(&self) -> Example {
        self.features()
            .into_iter()
            .map(|(name, feature)| (name.to_string(), feature))
            .collect()
    }

    /// Check `example` against [`SCHEMA`] and pull out the typed fields.
    pub fn from_example(example: Example) -> CocoRecordResult<Self> {
        let mut features = example.into_hash_map();
        if let Some(unknown) = features
            .keys()
            .find(|name| !SCHEMA.iter().any(|(field, _, _)| *field == name.as_str()))
        {
            return Err(CocoRecordError::Schema(format!("Unexpected field '{unknown}'")));
        }

        let image = take_bytes(&mut features, FIELD_IMAGE)?;
        let path = String::from_utf8(take_bytes(&mut features, FIELD_PATH)?).map_err(|e| {
            CocoRecordError::Schema(format!("Field '{FIELD_PATH}' is not UTF-8: {e}"))
        })?;

        Ok(Self {
            image: Bytes::from(image),
            path,
            area: take_floats(&mut features, FIELD_AREA, Arity::Scalar)?[0],
            bbox: take_floats(&mut features, FIELD_BBOX, Arity::Variable)?,
            category_id: take_int64(&mut features, FIELD_CATEGORY_ID)?,
            id: take_int64(&mut features, FIELD_ID)?,
            image_id: take_int64(&mut features, FIELD_IMAGE_ID)?,
        })
    }

    /// Serialise as a `tf.train.Example`.
    ///
    /// `Features.feature` is a map, so each field goes out as its own
    /// one-entry message; protobuf merges them on parse. This pins the entry
    /// order to [`SCHEMA`] and keeps shard bytes reproducible.
    pub fn encode(&self) -> CocoRecordResult<Vec<u8>> {
        let mut buf = Vec::new();
        for (name, feature) in self.features() {
            let single: Example = [(name.to_string(), feature)].into_iter().collect();
            buf.extend(<Example as Record>::to_bytes(single)?);
        }
        Ok(buf)
    }

    pub fn decode(buf: &[u8]) -> CocoRecordResult<Self> {
        Self::from_example(<Example as Record>::from_bytes(buf.to_vec())?)
    }
}

type FeatureMap = HashMap<String, Feature>;

fn take_feature(features: &mut FeatureMap, name: &str) -> CocoRecordResult<Feature> {
    features
        .remove(name)
        .ok_or_else(|| CocoRecordError::Schema(format!("Missing field '{name}'")))
}

fn kind_mismatch(name: &str, expected: ValueKind, found: &Feature) -> CocoRecordError {
    match ValueKind::of(found) {
        Some(found) => CocoRecordError::Schema(format!(
            "Field '{name}' should be {expected}, found {found}"
        )),
        None => CocoRecordError::Schema(format!("Field '{name}' has no value")),
    }
}

fn check_scalar(name: &str, len: usize) -> CocoRecordResult<()> {
    if len != 1 {
        return Err(CocoRecordError::Schema(format!(
            "Field '{name}' should hold exactly one value, found {len}"
        )));
    }
    Ok(())
}

fn take_bytes(features: &mut FeatureMap, name: &str) -> CocoRecordResult<Vec<u8>> {
    let mut values = take_feature(features, name)?
        .into_bytes_list()
        .map_err(|other| kind_mismatch(name, ValueKind::Bytes, &other))?;
    check_scalar(name, values.len())?;
    Ok(values.remove(0))
}

fn take_floats(features: &mut FeatureMap, name: &str, arity: Arity) -> CocoRecordResult<Vec<f32>> {
    let values = take_feature(features, name)?
        .into_f32_list()
        .map_err(|other| kind_mismatch(name, ValueKind::Float, &other))?;
    if arity == Arity::Scalar {
        check_scalar(name, values.len())?;
    }
    Ok(values)
}

fn take_int64(features: &mut FeatureMap, name: &str) -> CocoRecordResult<i64> {
    let values = take_feature(features, name)?
        .into_i64_list()
        .map_err(|other| kind_mismatch(name, ValueKind::Int64, &other))?;
    check_scalar(name, values.len())?;
    Ok(values[0])
}

// ---------------------------------------------------------------------------
// Sample
// ---------------------------------------------------------------------------

/// A fully decoded record with the image as RGB pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub image: RgbImage,
    pub path: String,
    pub area: f32,
    pub bbox: Vec<f32>,
    pub category_id: i64,
    pub id: i64,
    pub image_id: i64,
}

impl Sample {
    pub fn from_record(record: EncodedRecord) -> CocoRecordResult<Self> {
        Ok(Self {
            image: jpeg::decode_rgb(&record.image)?,
            path: record.path,
            area: record.area,
            bbox: record.bbox,
            category_id: record.category_id,
            id: record.id,
            image_id: record.image_id,
        })
    }

    /// `(height, width, channels)`.
    pub fn image_shape(&self) -> (u32, u32, usize) {
        (self.image.height(), self.image.width(), CHANNELS)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{FIELD_PATH}: {}", self.path)?;
        writeln!(f, "{FIELD_AREA}: {}", self.area)?;
        writeln!(f, "{FIELD_BBOX}: {:?}", self.bbox)?;
        writeln!(f, "{FIELD_CATEGORY_ID}: {}", self.category_id)?;
        writeln!(f, "{FIELD_ID}: {}", self.id)?;
        writeln!(f, "{FIELD_IMAGE_ID}: {}", self.image_id)?;
        let (h, w, c) = self.image_shape();
        write!(f, "Image shape: ({h}, {w}, {c})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::jpeg::tests::tiny_jpeg;

    fn record() -> EncodedRecord {
        let annotation = Annotation {
            area: 702.1057,
            bbox: vec![473.07, 395.93, 38.65, 28.67],
            category_id: 18,
            id: 1768,
            image_id: 289343,
        };
        EncodedRecord::from_annotation(
            &annotation,
            "datasets/val2017/000000289343.jpg",
            Bytes::from(tiny_jpeg(6, 4)),
        )
    }

    fn small_record() -> EncodedRecord {
        EncodedRecord {
            image: Bytes::from_static(&[0xff, 0xd8]),
            path: "a.jpg".into(),
            area: 1.5,
            bbox: vec![2.0, 0.5],
            category_id: 3,
            id: 4,
            image_id: 289343,
        }
    }

    // `small_record` as a tf.train.Example, one map entry per message:
    // Example{1: Features{1: entry{1: name, 2: Feature{kind: list}}}}.
    fn image_entry() -> Vec<u8> {
        let mut out = vec![0x0a, 0x11, 0x0a, 0x0f, 0x0a, 0x05];
        out.extend_from_slice(b"image");
        out.extend_from_slice(&[0x12, 0x06, 0x0a, 0x04, 0x0a, 0x02, 0xff, 0xd8]);
        out
    }

    fn path_entry() -> Vec<u8> {
        let mut out = vec![0x0a, 0x13, 0x0a, 0x11, 0x0a, 0x04];
        out.extend_from_slice(b"path");
        out.extend_from_slice(&[0x12, 0x09, 0x0a, 0x07, 0x0a, 0x05]);
        out.extend_from_slice(b"a.jpg");
        out
    }

    fn area_entry() -> Vec<u8> {
        let mut out = vec![0x0a, 0x12, 0x0a, 0x10, 0x0a, 0x04];
        out.extend_from_slice(b"area");
        out.extend_from_slice(&[0x12, 0x08, 0x12, 0x06, 0x0a, 0x04, 0x00, 0x00, 0xc0, 0x3f]);
        out
    }

    fn bbox_entry() -> Vec<u8> {
        let mut out = vec![0x0a, 0x16, 0x0a, 0x14, 0x0a, 0x04];
        out.extend_from_slice(b"bbox");
        out.extend_from_slice(&[0x12, 0x0c, 0x12, 0x0a, 0x0a, 0x08]);
        out.extend_from_slice(&[0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00, 0x3f]);
        out
    }

    fn category_entry() -> Vec<u8> {
        let mut out = vec![0x0a, 0x16, 0x0a, 0x14, 0x0a, 0x0b];
        out.extend_from_slice(b"category_id");
        out.extend_from_slice(&[0x12, 0x05, 0x1a, 0x03, 0x0a, 0x01, 0x03]);
        out
    }

    fn id_entry() -> Vec<u8> {
        let mut out = vec![0x0a, 0x0d, 0x0a, 0x0b, 0x0a, 0x02];
        out.extend_from_slice(b"id");
        out.extend_from_slice(&[0x12, 0x05, 0x1a, 0x03, 0x0a, 0x01, 0x04]);
        out
    }

    fn image_id_entry() -> Vec<u8> {
        let mut out = vec![0x0a, 0x15, 0x0a, 0x13, 0x0a, 0x08];
        out.extend_from_slice(b"image_id");
        out.extend_from_slice(&[0x12, 0x07, 0x1a, 0x05, 0x0a, 0x03, 0xbf, 0xd4, 0x11]);
        out
    }

    fn golden() -> Vec<u8> {
        [
            image_entry(),
            path_entry(),
            area_entry(),
            bbox_entry(),
            category_entry(),
            id_entry(),
            image_id_entry(),
        ]
        .concat()
    }

    fn with_feature(record: &EncodedRecord, name: &str, feature: Feature) -> Example {
        let mut features = record.to_example().into_hash_map();
        features.insert(name.to_string(), feature);
        features.into_iter().collect()
    }

    fn without_feature(record: &EncodedRecord, name: &str) -> Example {
        let mut features = record.to_example().into_hash_map();
        features.remove(name);
        features.into_iter().collect()
    }

    #[test]
    fn encoding_matches_known_bytes() {
        assert_eq!(small_record().encode().unwrap(), golden());
    }

    #[test]
    fn known_bytes_decode() {
        assert_eq!(EncodedRecord::decode(&golden()).unwrap(), small_record());
    }

    #[test]
    fn entry_order_does_not_matter() {
        let reversed = [
            image_id_entry(),
            id_entry(),
            category_entry(),
            bbox_entry(),
            area_entry(),
            path_entry(),
            image_entry(),
        ]
        .concat();
        assert_eq!(EncodedRecord::decode(&reversed).unwrap(), small_record());
    }

    #[test]
    fn unpacked_int64_list_decodes() {
        // id as Int64List{1: 4} with a plain varint tag instead of packed.
        let mut unpacked_id = vec![0x0a, 0x0c, 0x0a, 0x0a, 0x0a, 0x02];
        unpacked_id.extend_from_slice(b"id");
        unpacked_id.extend_from_slice(&[0x12, 0x04, 0x1a, 0x02, 0x08, 0x04]);
        let bytes = [
            image_entry(),
            path_entry(),
            area_entry(),
            bbox_entry(),
            category_entry(),
            unpacked_id,
            image_id_entry(),
        ]
        .concat();
        assert_eq!(EncodedRecord::decode(&bytes).unwrap(), small_record());
    }

    #[test]
    fn whole_example_encoding_decodes_the_same() {
        let rec = record();
        let bytes = <Example as Record>::to_bytes(rec.to_example()).unwrap();
        assert_eq!(EncodedRecord::decode(&bytes).unwrap(), rec);
    }

    #[test]
    fn encode_decode_record() {
        let rec = record();
        let decoded = EncodedRecord::decode(&rec.encode().unwrap()).unwrap();
        assert_eq!(decoded, rec);
    }

    #[test]
    fn features_follow_schema() {
        let features = record().features();
        for ((name, feature), (field, kind, _)) in features.iter().zip(SCHEMA) {
            assert_eq!(*name, field);
            assert_eq!(ValueKind::of(feature), Some(kind), "{name}");
        }
    }

    #[test]
    fn unexpected_field_is_rejected() {
        let example = with_feature(&record(), "iscrowd", Feature::from_i64_list(vec![0]));
        assert!(matches!(
            EncodedRecord::from_example(example),
            Err(CocoRecordError::Schema(msg)) if msg.contains("iscrowd")
        ));
    }

    #[test]
    fn missing_field_is_rejected() {
        let example = without_feature(&record(), FIELD_IMAGE_ID);
        assert!(matches!(
            EncodedRecord::from_example(example),
            Err(CocoRecordError::Schema(msg)) if msg.contains(FIELD_IMAGE_ID)
        ));
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let example = with_feature(&record(), FIELD_AREA, Feature::from_i64_list(vec![3]));
        assert!(matches!(
            EncodedRecord::from_example(example),
            Err(CocoRecordError::Schema(msg)) if msg.contains("int64_list")
        ));
    }

    #[test]
    fn empty_feature_is_rejected() {
        let example = with_feature(&record(), FIELD_ID, Feature::empty());
        assert!(matches!(
            EncodedRecord::from_example(example),
            Err(CocoRecordError::Schema(msg)) if msg.contains("no value")
        ));
    }

    #[test]
    fn scalar_with_two_values_is_rejected() {
        let example = with_feature(&record(), FIELD_ID, Feature::from_i64_list(vec![1, 2]));
        assert!(matches!(
            EncodedRecord::from_example(example),
            Err(CocoRecordError::Schema(_))
        ));
    }

    #[test]
    fn garbage_payload_is_corrupt() {
        assert!(matches!(
            EncodedRecord::decode(&[0x0a, 0x7f, 0x01]),
            Err(CocoRecordError::Corrupt(_))
        ));
    }

    #[test]
    fn bbox_may_have_any_length() {
        let mut rec = record();
        rec.bbox = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(EncodedRecord::decode(&rec.encode().unwrap()).unwrap().bbox.len(), 6);
        rec.bbox.clear();
        assert!(EncodedRecord::decode(&rec.encode().unwrap()).unwrap().bbox.is_empty());
    }

    #[test]
    fn sample_has_three_channels() {
        let sample = Sample::from_record(record()).unwrap();
        assert_eq!(sample.image_shape(), (4, 6, 3));
        let text = sample.to_string();
        assert!(text.contains("image_id: 289343"));
        assert!(text.ends_with("Image shape: (4, 6, 3)"));
    }
}
