use thiserror::Error;

pub type CocoRecordResult<T> = Result<T, CocoRecordError>;

#[derive(Error, Debug)]
pub enum CocoRecordError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Image encode error: {0}")]
    ImageEncode(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<tfrecord::Error> for CocoRecordError {
    fn from(error: tfrecord::Error) -> Self {
        match error {
            tfrecord::Error::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                CocoRecordError::Corrupt(format!("Truncated record: {e}"))
            }
            tfrecord::Error::IoError(e) => CocoRecordError::Io(e),
            tfrecord::Error::UnexpectedEof => {
                CocoRecordError::Corrupt("Truncated record header".into())
            }
            other => CocoRecordError::Corrupt(other.to_string()),
        }
    }
}
