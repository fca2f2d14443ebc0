use thiserror::Error;

pub type Result<T> = std::result::Result<T, HistoryError>;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt history entry at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },
}
