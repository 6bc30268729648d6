//! Codec configuration types and builders.

use std::fmt;

use crate::protocol::constants::DEFAULT_MAX_BYTE_ARRAY_LEN;

/// Configuration error returned when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

/// What happens to raw key bytes once the key has been materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum KeyBytesPolicy {
    /// Keep the received bytes next to the materialized key.
    #[default]
    Retain,
    /// Drop the received bytes; they are re-created on the next marshal.
    Clear,
}

/// Settings shared by entry encoders and decoders.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodecConfig {
    max_byte_array_len: usize,
    key_bytes_policy: KeyBytesPolicy,
}

impl CodecConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CodecConfigBuilder {
        CodecConfigBuilder::new()
    }

    /// Returns the largest byte array a decoder accepts.
    pub fn max_byte_array_len(&self) -> usize {
        self.max_byte_array_len
    }

    /// Returns the policy applied to raw key bytes after materialization.
    pub fn key_bytes_policy(&self) -> KeyBytesPolicy {
        self.key_bytes_policy
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_byte_array_len: DEFAULT_MAX_BYTE_ARRAY_LEN,
            key_bytes_policy: KeyBytesPolicy::default(),
        }
    }
}

/// Builder for [`CodecConfig`].
#[derive(Debug, Clone, Default)]
pub struct CodecConfigBuilder {
    max_byte_array_len: Option<usize>,
    key_bytes_policy: Option<KeyBytesPolicy>,
}

impl CodecConfigBuilder {
    /// Creates a new builder with all settings unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the largest byte array a decoder accepts.
    pub fn max_byte_array_len(mut self, len: usize) -> Self {
        self.max_byte_array_len = Some(len);
        self
    }

    /// Sets the policy applied to raw key bytes after materialization.
    pub fn key_bytes_policy(mut self, policy: KeyBytesPolicy) -> Self {
        self.key_bytes_policy = Some(policy);
        self
    }

    /// Validates the settings and builds the configuration.
    pub fn build(self) -> Result<CodecConfig, ConfigError> {
        let max_byte_array_len = self
            .max_byte_array_len
            .unwrap_or(DEFAULT_MAX_BYTE_ARRAY_LEN);

        if max_byte_array_len == 0 {
            return Err(ConfigError::new("max_byte_array_len must be positive"));
        }

        if max_byte_array_len > i32::MAX as usize {
            return Err(ConfigError::new(
                "max_byte_array_len must fit a 32-bit length prefix",
            ));
        }

        Ok(CodecConfig {
            max_byte_array_len,
            key_bytes_policy: self.key_bytes_policy.unwrap_or_default(),
        })
    }
}
