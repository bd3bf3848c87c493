use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage tier unavailable: {0}")]
    Unavailable(String),

    #[error("Storage quota exceeded: {needed} bytes needed, {budget} byte budget")]
    QuotaExceeded { needed: usize, budget: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Corrupt stored value under {key}: {reason}")]
    Corrupt { key: String, reason: String },
}
