//! Wire decoding errors

use thiserror::Error;

/// Errors decoding a marked sync message
#[derive(Error, Debug)]
pub enum WireError {
    #[error("Malformed sync message: {0}")]
    Malformed(String),

    #[error("Invalid speed in sync message: {0}")]
    InvalidSpeed(f64),

    #[error("Payload is not JSON: {0}")]
    NotJson(String),
}

/// Result type for wire operations
pub type WireResult<T> = Result<T, WireError>;
