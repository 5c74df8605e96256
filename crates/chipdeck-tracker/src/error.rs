//! Error types for module parsing.

/// Result type for modplay operations.
pub type Result<T> = std::result::Result<T, ModError>;

/// Errors reported by the modplay engine.
#[derive(thiserror::Error, Debug)]
pub enum ModError {
    /// Data too short to hold a ProTracker header.
    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum size for the header.
        expected: usize,
        /// Actual data size.
        actual: usize,
    },

    /// The four-byte signature at offset 1080 is not a known 4-channel tag.
    #[error("unknown module signature {0:?}")]
    BadSignature(String),

    /// The order table references patterns beyond the end of the data.
    #[error("pattern data truncated: need {needed} bytes for {patterns} patterns, got {actual}")]
    TruncatedPatterns {
        /// Bytes required by the referenced patterns.
        needed: usize,
        /// Number of patterns referenced by the order table.
        patterns: usize,
        /// Actual data size.
        actual: usize,
    },

    /// The song length byte is outside 1..=128.
    #[error("invalid song length {0}")]
    InvalidSongLength(usize),
}
