//! Error types for SID tune loading and playback.

/// Result type for sidcore operations.
pub type Result<T> = std::result::Result<T, SidError>;

/// Errors reported by the sidcore engine.
#[derive(thiserror::Error, Debug)]
pub enum SidError {
    /// Data too short for the PSID header.
    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum header size.
        expected: usize,
        /// Actual data size.
        actual: usize,
    },

    /// Missing `PSID`/`RSID` magic.
    #[error("missing PSID/RSID magic")]
    BadMagic,

    /// The header declares zero songs.
    #[error("header declares no songs")]
    NoSongs,

    /// A ROM image could not be read or has the wrong size.
    #[error("ROM image '{name}': {reason}")]
    RomImage {
        /// Image file name.
        name: String,
        /// Why the image is unusable.
        reason: String,
    },

    /// The resampler builder was configured with an unusable state.
    #[error("resampler unhealthy: {0}")]
    ResamplerUnhealthy(String),

    /// Song index outside the tune's range.
    #[error("invalid song {index} (available: 1-{available})")]
    InvalidSong {
        /// Requested 1-based song.
        index: usize,
        /// Number of songs in the tune.
        available: usize,
    },
}
