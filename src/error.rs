//! Error types for Hirewise.

use thiserror::Error;

/// Main error type for Hirewise operations.
///
/// Rate limit checks and job posting parsing never fail; these variants
/// cover the fallible edges around them.
#[derive(Error, Debug)]
pub enum HirewiseError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A limit policy with a zero limit or window
    #[error("Invalid rate limit policy: {0}")]
    InvalidPolicy(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Hirewise operations.
pub type Result<T> = std::result::Result<T, HirewiseError>;
