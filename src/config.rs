//! Decoder configuration

use crate::error::{Error, Result};

/// Default maximum nesting depth for arrays/objects (prevent stack overflow)
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Default cap on the number of entries in each reference table
pub const DEFAULT_MAX_TABLE_LEN: usize = 1 << 24;

/// AMF3 decoder configuration options
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Maximum nesting depth of complex values
    pub max_nesting_depth: usize,

    /// Accept 4-byte UTF-8 sequences in strings
    ///
    /// The AMF3 string codec only knows 1-, 2- and 3-byte forms. Producers
    /// that emit standard UTF-8 for supplementary characters are rejected
    /// unless this is enabled.
    pub allow_four_byte_utf8: bool,

    /// Decode a NaN number as `Amf3Value::Null`
    pub nan_as_null: bool,

    /// Maximum number of entries in each of the string, object and traits tables
    pub max_table_len: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            allow_four_byte_utf8: false,
            nan_as_null: true,
            max_table_len: DEFAULT_MAX_TABLE_LEN,
        }
    }
}

impl DecoderConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Lossless preset: keep NaN numbers and accept standard 4-byte UTF-8
    pub fn lossless() -> Self {
        Self {
            allow_four_byte_utf8: true,
            nan_as_null: false,
            ..Self::default()
        }
    }

    /// Set the maximum nesting depth
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Accept or reject 4-byte UTF-8 sequences
    pub fn allow_four_byte_utf8(mut self, allow: bool) -> Self {
        self.allow_four_byte_utf8 = allow;
        self
    }

    /// Map NaN numbers to null (default) or keep them
    pub fn nan_as_null(mut self, enabled: bool) -> Self {
        self.nan_as_null = enabled;
        self
    }

    /// Set the per-table entry limit
    pub fn max_table_len(mut self, len: usize) -> Self {
        self.max_table_len = len;
        self
    }

    /// Check the configuration for values the decoder cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_nesting_depth == 0 {
            return Err(Error::Config(
                "max_nesting_depth must be at least 1".into(),
            ));
        }
        if self.max_table_len == 0 {
            return Err(Error::Config("max_table_len must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DecoderConfig::default();
        assert_eq!(config.max_nesting_depth, DEFAULT_MAX_NESTING_DEPTH);
        assert!(!config.allow_four_byte_utf8);
        assert!(config.nan_as_null);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let config = DecoderConfig::new()
            .max_nesting_depth(8)
            .allow_four_byte_utf8(true)
            .nan_as_null(false)
            .max_table_len(100);
        assert_eq!(config.max_nesting_depth, 8);
        assert!(config.allow_four_byte_utf8);
        assert!(!config.nan_as_null);
        assert_eq!(config.max_table_len, 100);
    }

    #[test]
    fn test_lossless_preset() {
        let config = DecoderConfig::lossless();
        assert!(config.allow_four_byte_utf8);
        assert!(!config.nan_as_null);
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        assert!(matches!(
            DecoderConfig::new().max_nesting_depth(0).validate(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            DecoderConfig::new().max_table_len(0).validate(),
            Err(Error::Config(_))
        ));
    }
}
