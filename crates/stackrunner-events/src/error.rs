use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("unknown operation kind: {0}")]
    UnknownOperation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
