//! Typed error definitions for the chain core.
//!
//! NO PANICS in the admit/reason/decay hot paths - those return plain
//! values (spec §7). Errors are reserved for the edge-facing operations:
//! persistence, mindset parsing, and the strict admission variant.

use thiserror::Error;

/// Result type alias for fallible chain operations.
pub type Result<T> = std::result::Result<T, ChainError>;

/// Chain-core errors. Never panics or unwinds across a public boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    // ==================== ARGUMENT ERRORS ====================
    #[error("invalid argument: {detail}")]
    InvalidArgument { detail: String },

    // ==================== CAPACITY ERRORS ====================
    #[error("chain capacity reached: no free slot after cleanup")]
    CapacityReached,

    // ==================== PERSISTENCE ERRORS ====================
    #[error("parse failure: {detail}")]
    ParseFailure { detail: String },

    #[error("io failure: {detail}")]
    IoFailure { detail: String },

    #[error("file too large: {actual} bytes exceeds {max} byte limit")]
    FileTooLarge { actual: u64, max: u64 },
}

impl ChainError {
    /// Error code for monitoring and alerting.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "E1000",
            Self::CapacityReached => "E2000",
            Self::ParseFailure { .. } => "E3000",
            Self::IoFailure { .. } => "E3001",
            Self::FileTooLarge { .. } => "E3002",
        }
    }

    /// Is this error recoverable? (for host-side retry logic)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::CapacityReached)
    }

    /// Should this error trigger an alert?
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::ParseFailure { .. } | Self::IoFailure { .. })
    }
}

impl From<std::io::Error> for ChainError {
    fn from(e: std::io::Error) -> Self {
        ChainError::IoFailure {
            detail: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_unique() {
        let errors = vec![
            ChainError::InvalidArgument {
                detail: "x".into(),
            }
            .error_code(),
            ChainError::CapacityReached.error_code(),
            ChainError::ParseFailure {
                detail: "x".into(),
            }
            .error_code(),
            ChainError::IoFailure {
                detail: "x".into(),
            }
            .error_code(),
            ChainError::FileTooLarge { actual: 1, max: 1 }.error_code(),
        ];
        let mut seen = std::collections::HashSet::new();
        for code in errors {
            assert!(seen.insert(code), "duplicate error code: {code}");
        }
    }

    #[test]
    fn test_capacity_reached_is_recoverable() {
        assert!(ChainError::CapacityReached.is_recoverable());
        assert!(!ChainError::InvalidArgument { detail: "x".into() }.is_recoverable());
    }

    #[test]
    fn test_parse_failure_is_critical() {
        assert!(ChainError::ParseFailure {
            detail: "x".into()
        }
        .is_critical());
        assert!(!ChainError::CapacityReached.is_critical());
    }
}
