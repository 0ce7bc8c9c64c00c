use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Invalid queue position {position} (queue length {len})")]
    InvalidPosition { position: usize, len: usize },

    #[error("Identity key {0} already present in queue")]
    DuplicateKey(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] BridgeError),

    #[error("Corrupt persisted record: {0}")]
    CorruptRecord(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

pub type Result<T> = std::result::Result<T, QueueError>;
