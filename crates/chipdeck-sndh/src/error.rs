//! Error types for SNDH parsing and playback.

/// Result type for sndhcore operations.
pub type Result<T> = std::result::Result<T, SndhError>;

/// Errors reported by the sndhcore engine.
#[derive(thiserror::Error, Debug)]
pub enum SndhError {
    /// Data too short for the BRA + magic prologue.
    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum prologue size.
        expected: usize,
        /// Actual data size.
        actual: usize,
    },

    /// Missing `SNDH` magic at offset 12.
    #[error("invalid SNDH header: {0}")]
    InvalidHeader(String),

    /// Sub-song index outside the tune's range.
    #[error("invalid subsong {index} (available: 1-{available})")]
    InvalidSubsong {
        /// Requested 1-based sub-song.
        index: usize,
        /// Number of sub-songs in the tune.
        available: usize,
    },

    /// The process-wide core failed to initialize.
    #[error("core initialization failed: {0}")]
    CoreInit(String),
}
