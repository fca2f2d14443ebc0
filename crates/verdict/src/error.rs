use std::fmt::Display;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VerdictError>;

#[derive(Error, Debug)]
pub enum VerdictError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Similarity backend unavailable for '{source_type}': {reason}")]
    BackendUnavailable { source_type: String, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl VerdictError {
    pub(crate) fn backend_unavailable(source_type: impl Into<String>, reason: impl Display) -> Self {
        Self::BackendUnavailable {
            source_type: source_type.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::ConfigurationInvalid(message.into())
    }
}
