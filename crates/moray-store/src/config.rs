//! Configuration for the in-memory store
//!
//! Entry-size limits guard the store against unbounded single entries;
//! everything else about the store is fixed by its data structure.

use crate::error::{StoreError, StoreResult};

/// Store configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum encoded key size in bytes
    pub max_key_size: usize,
    /// Maximum value payload size in bytes
    pub max_value_size: usize,
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> StoreResult<()> {
        if self.max_key_size == 0 {
            return Err(StoreError::InvalidConfig {
                reason: "max_key_size must be > 0".into(),
            });
        }
        if self.max_value_size == 0 {
            return Err(StoreError::InvalidConfig {
                reason: "max_value_size must be > 0".into(),
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_key_size: 4096,
            max_value_size: 16 * 1024 * 1024,
        }
    }
}
