//! Error types for NSF loading and playback.

/// Result type for nsfcore operations.
pub type Result<T> = std::result::Result<T, NsfError>;

/// Errors reported by the nsfcore engine.
#[derive(thiserror::Error, Debug)]
pub enum NsfError {
    /// Data does not start with the `NESM\x1a` magic.
    #[error("missing NESM magic")]
    BadMagic,

    /// Data too short for the fixed 128-byte header.
    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum header size.
        expected: usize,
        /// Actual data size.
        actual: usize,
    },

    /// The header declares zero songs.
    #[error("header declares no songs")]
    NoSongs,

    /// Track index outside the image's song range.
    #[error("invalid track {index} (0-based, {count} songs)")]
    InvalidTrack {
        /// Requested 0-based track.
        index: usize,
        /// Number of songs in the image.
        count: usize,
    },
}
