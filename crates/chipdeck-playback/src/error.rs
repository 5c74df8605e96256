//! Error types for engine construction.

/// Result type for playback-engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised while standing up the playback engine.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// The audio sink could not be armed.
    #[error("audio sink unavailable: {0}")]
    SinkUnavailable(String),
}
