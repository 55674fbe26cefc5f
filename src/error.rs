//! Error types for path handling.

use std::fmt;

use thiserror::Error;

use crate::types::IsdAsn;

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type.
#[derive(Error, Debug)]
pub enum Error {
    // Raw path errors
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    // Path source errors
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    // Caller errors
    #[error("hop index {index} out of range (path has {len} hops)")]
    Bounds { index: usize, len: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Raw path parsing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("buffer too short: need {needed} bytes, got {actual}")]
    BufferTooShort { needed: usize, actual: usize },

    #[error("{0} trailing bytes after path")]
    TrailingBytes(usize),

    #[error("path has no segments")]
    NoSegments,

    #[error("segment {index} is empty but a later segment is not")]
    SegmentGap { index: usize },

    #[error("too many hop fields: {0} (max 64)")]
    TooManyHops(usize),

    #[error("segment {index} length {len} does not fit in 6 bits")]
    SegmentTooLong { index: usize, len: usize },

    #[error("invalid cursor: {field}={value}, limit {limit}")]
    InvalidCursor {
        field: &'static str,
        value: u8,
        limit: usize,
    },

    #[error("unsupported path type: {0}")]
    UnsupportedPathType(u8),

    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),
}

/// Path source lookup errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no paths to {0}")]
    NoPaths(IsdAsn),

    #[error("destination {dst} unreachable: {reason}")]
    Unreachable { dst: IsdAsn, reason: String },
}

impl Error {
    /// Check if the caller may reasonably retry the operation later.
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Lookup(LookupError::Unreachable { .. }))
    }

    /// Check if error is the caller's fault rather than bad input data.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Error::Bounds { .. } | Error::InvalidArgument(_))
    }
}

/// Error context for debugging.
#[derive(Debug)]
pub struct ErrorContext {
    pub destination: Option<IsdAsn>,
    pub fingerprint: Option<String>,
    pub operation: String,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation={}", self.operation)?;
        if let Some(dst) = self.destination {
            write!(f, ", dst={dst}")?;
        }
        if let Some(ref fp) = self.fingerprint {
            write!(f, ", fingerprint={fp}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::BufferTooShort {
            needed: 16,
            actual: 4,
        };
        assert_eq!(err.to_string(), "buffer too short: need 16 bytes, got 4");

        let err: Error = DecodeError::UnsupportedPathType(4).into();
        assert_eq!(err.to_string(), "decode error: unsupported path type: 4");
    }

    #[test]
    fn test_bounds_display() {
        let err = Error::Bounds { index: 5, len: 3 };
        assert_eq!(err.to_string(), "hop index 5 out of range (path has 3 hops)");
        assert!(err.is_caller_error());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_lookup_recoverable() {
        let dst: IsdAsn = "1-ff00:0:110".parse().unwrap();
        let err: Error = LookupError::Unreachable {
            dst,
            reason: "daemon down".into(),
        }
        .into();
        assert!(err.is_recoverable());

        let err: Error = LookupError::NoPaths(dst).into();
        assert!(!err.is_recoverable());
        assert!(!Error::Config("Failed to read config: denied".into()).is_recoverable());
        assert_eq!(err.to_string(), "lookup error: no paths to 1-ff00:0:110");
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext {
            destination: Some("1-ff00:0:110".parse().unwrap()),
            fingerprint: None,
            operation: "select".into(),
        };
        assert_eq!(ctx.to_string(), "operation=select, dst=1-ff00:0:110");
    }
}
