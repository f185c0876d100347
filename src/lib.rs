pub mod annotations;
pub mod codecs;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod logging;
pub mod schema;
pub mod shard;
pub mod store;

// Re-export key types at crate root for convenience.
pub use annotations::{Annotation, load_annotations, parse_annotations};
pub use codecs::{Compression, CompressionId};
pub use config::{DecoderConfig, EncoderConfig};
pub use decoder::{ShardReader, open_shard, read_shard_records, take};
pub use encoder::{ShardSummary, encode_dataset};
pub use error::{CocoRecordError, CocoRecordResult};
pub use schema::{EncodedRecord, Sample};
pub use store::{ImageSource, InMemoryImages, LocalImageDir};
