//! Error types
//!
//! The engines themselves never fail: lookups report "not found" through
//! `Option`. The only error path is construction with a bad configuration.

use std::fmt;

/// Configuration errors raised when building an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Tree fanout below 2, splitting could never make progress
    InvalidDegree(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDegree(degree) => {
                write!(f, "Invalid tree degree {} (must be at least 2)", degree)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
