//! Error types for timewarp

use thiserror::Error;

/// Core timewarp errors
#[derive(Error, Debug)]
pub enum TimewarpError {
    // API errors
    #[error("Invalid speed multiplier: {0}")]
    InvalidSpeed(f64),

    // Installation errors
    #[error("Unsupported realm: {0}")]
    UnsupportedRealm(&'static str),

    #[error("Already installed under guard {0}")]
    AlreadyInstalled(String),

    #[error("Engine not installed")]
    NotInstalled,

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for timewarp operations
pub type TimewarpResult<T> = Result<T, TimewarpError>;
