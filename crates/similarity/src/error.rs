use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimilarityError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    #[error("Similarity backend error: {0}")]
    Backend(String),

    #[error("Similarity backend timed out")]
    Timeout,

    #[error("Backend returned {actual} scores for {expected} candidates")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("{0}")]
    Other(String),
}
