// common/src/error.rs
use thiserror::Error;

/// Failure kinds shared by both services
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    /// A required field is missing or malformed
    #[error("{0}")]
    InvalidInput(String),

    /// An external HTTP call failed or returned an unexpected response
    #[error("upstream failure: {0}")]
    UpstreamFailure(String),

    /// The cache or the encryption backend could not serve the request
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The call was aborted through its cancellation token
    #[error("cancelled")]
    Cancelled,
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamFailure(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;
