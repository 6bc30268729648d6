//! Error types for entry codec and marshalling operations.

use thiserror::Error;

/// The main error type for cache entry wire operations.
///
/// Running out of buffer space is never reported through this type: the
/// codec signals it by returning `Ok(false)` and keeping its cursor.
#[derive(Debug, Error)]
pub enum CacheWireError {
    /// A caller broke an API contract (missing key, unmarshalled payload,
    /// reuse of a completed codec). Not retryable.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// The conversion context could not encode an object.
    #[error("marshal error: {0}")]
    Marshal(String),

    /// The conversion context could not decode bytes or resolve their type.
    #[error("unmarshal error: {0}")]
    Unmarshal(String),

    /// Malformed wire input (unexpected type tag, bad lengths, missing fields).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Primitive data input/output errors.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CacheWireError {
    /// Returns `true` if the error only affects the record being processed.
    ///
    /// Contract violations indicate a programming error in the caller and
    /// are not considered recoverable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CacheWireError::ContractViolation(_))
    }
}

/// A specialized `Result` type for cache entry wire operations.
pub type Result<T> = std::result::Result<T, CacheWireError>;
