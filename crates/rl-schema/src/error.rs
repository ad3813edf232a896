use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("record type not found: {0}")]
    RecordTypeNotFound(String),
    #[error("index not found: {0}")]
    IndexNotFound(String),
    #[error("duplicate name in schema: {0}")]
    DuplicateName(String),
    #[error("failed to serialize record: {0}")]
    SerializationFailed(String),
    #[error("failed to deserialize record: {0}")]
    DeserializationFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
