//! Console music decoder plugin (NSF).
//!
//! Wraps the `nsfcore` engine behind the chipdeck `DecoderPlugin`
//! contract. NSF files carry many sub-tracks; the engine indexes them
//! 0-based while the plugin reports 1-based track numbers, and the plugin
//! advances to the next sub-track silently when the engine reports natural
//! end-of-track; `decode()` only signals end-of-stream after the last
//! one.
//!
//! Consoles store no per-track durations, so the play length of each
//! sub-track comes from the `gamemusic.track-seconds` setting.

mod adapter;
mod error;
pub mod nsfcore;

pub use adapter::{GameMusicPlugin, TRACK_SECONDS_SETTING};
pub use error::NsfError;
