//! Error taxonomy shared by all decoder plugins.
//!
//! Three failure classes with distinct policies:
//!
//! - [`SetupError`]: one-time plugin initialization failed. The registry
//!   logs it and excludes the plugin; never fatal to the process.
//! - [`OpenError`]: a buffer could not be opened as this format. Surfaced
//!   synchronously to the caller; the engine stays out of Playing/Paused.
//! - [`DecodeError`]: the engine reported an unrecoverable failure while
//!   rendering. Caught at the real-time callback boundary and converted
//!   into a mailbox-posted error notification plus a forced stop.
//!
//! Out-of-range subsong requests are deliberately *not* errors; they are
//! defined no-ops or distinguished notifications.

/// One-time plugin setup failure.
#[derive(thiserror::Error, Debug)]
pub enum SetupError {
    /// A required external resource could not be acquired.
    #[error("missing resource '{name}': {reason}")]
    MissingResource {
        /// Resource identifier (e.g. a ROM image file name).
        name: String,
        /// Why acquisition failed.
        reason: String,
    },

    /// The wrapped decoding engine failed to initialize.
    #[error("engine initialization failed: {0}")]
    EngineInit(String),
}

/// Failure to open a buffer as a plugin's format.
#[derive(thiserror::Error, Debug)]
pub enum OpenError {
    /// The buffer does not carry this format's magic/header.
    #[error("unrecognized header: {0}")]
    Format(String),

    /// The header matched but the decoding engine rejected the data.
    #[error("engine rejected data: {0}")]
    Load(String),
}

/// Unrecoverable failure reported by a decoding engine during `decode()`.
#[derive(thiserror::Error, Debug)]
#[error("decode failed: {0}")]
pub struct DecodeError(pub String);
