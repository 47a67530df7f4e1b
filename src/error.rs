use thiserror::Error;

pub type Result<T> = std::result::Result<T, BloomError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BloomError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SystemTime error: {0}")]
    TimeError(String),
}

impl From<std::time::SystemTimeError> for BloomError {
    fn from(err: std::time::SystemTimeError) -> Self {
        BloomError::TimeError(err.to_string())
    }
}

// Builders only fail on a missing required field
impl From<derive_builder::UninitializedFieldError> for BloomError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        BloomError::InvalidConfig(err.to_string())
    }
}
