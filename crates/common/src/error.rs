//! Common error types.

use thiserror::Error;

/// Main error type for the fluid engine.
#[derive(Error, Debug)]
pub enum FluidError {
    #[error("Drawing surface did not provide a 2D context")]
    ContextUnavailable,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type FluidResult<T> = Result<T, FluidError>;

impl FluidError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
