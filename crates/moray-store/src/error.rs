//! Error types for store operations
//!
//! All store errors are represented by the StoreError enum, which carries
//! enough context to report the failure without re-deriving state.

use std::error::Error;
use std::fmt;

/// Store error types with contextual detail
#[derive(Debug, Clone)]
pub enum StoreError {
    /// The index holds the maximum representable number of elements
    IndexFull {
        /// Element count at the time of the rejected insert
        size: u32,
    },

    /// Encoded key exceeds the configured limit
    OversizedKey {
        /// Size of the rejected key in bytes
        size: usize,
        /// Configured maximum key size
        limit: usize,
    },

    /// Value payload exceeds the configured limit
    OversizedValue {
        /// Size of the rejected value in bytes
        size: usize,
        /// Configured maximum value size
        limit: usize,
    },

    /// Configuration failed validation
    InvalidConfig {
        /// Description of the offending parameter
        reason: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::IndexFull { size } => {
                write!(f, "index is full: {} elements, cannot insert more", size)
            }

            StoreError::OversizedKey { size, limit } => {
                write!(f, "key too large: {} bytes exceeds limit of {} bytes", size, limit)
            }

            StoreError::OversizedValue { size, limit } => {
                write!(f, "value too large: {} bytes exceeds limit of {} bytes", size, limit)
            }

            StoreError::InvalidConfig { reason } => {
                write!(f, "invalid store configuration: {}", reason)
            }
        }
    }
}

impl Error for StoreError {}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
