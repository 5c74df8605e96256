//! Common traits and types for chipdeck decoder plugins.
//!
//! This crate provides the shared abstractions used across the chipdeck
//! player: the [`DecoderPlugin`] capability trait implemented by every
//! format adapter, the error taxonomy for setup/open/decode failures, the
//! typed [`Settings`] accessor consumed by adapters, the injected
//! [`TextCatalog`] used for human-readable messages, and the notification
//! types crossing the core boundary towards the UI.
//!
//! # Decode contract
//!
//! All plugins render interleaved 16-bit stereo PCM at [`SAMPLE_RATE`].
//! `decode()` is the only operation invoked from the audio-hardware thread;
//! everything else runs on the control thread.
//!
//! # Example
//!
//! ```ignore
//! use chipdeck_common::{DecoderPlugin, SAMPLE_RATE};
//!
//! fn pump(plugin: &dyn DecoderPlugin) {
//!     let mut block = vec![0i16; 4096];
//!     while plugin.decode(&mut block).unwrap_or(false) {
//!         // ... hand block to the audio sink
//!     }
//! }
//! ```

#![warn(missing_docs)]

mod catalog;
mod error;
mod mailbox;
mod notify;
mod plugin;
mod settings;

pub use catalog::TextCatalog;
pub use error::{DecodeError, OpenError, SetupError};
pub use mailbox::Mailbox;
pub use notify::{
    LoadRequest, Notification, PlayState, PlayStatus, PluginInformation, RenderFn,
};
pub use plugin::{DecoderPlugin, PluginContext};
pub use settings::{SettingValue, Settings};

// ============================================================================
// Common Constants
// ============================================================================

/// Output sample rate shared by every decoder plugin.
pub const SAMPLE_RATE: u32 = 48_000;

/// Number of interleaved output channels (stereo).
pub const CHANNELS: u16 = 2;

/// Samples (not frames) rendered per real-time decode block.
///
/// 2048 frames of stereo audio, about 42 ms at 48 kHz. One `decode()`
/// call must complete well inside that period.
pub const SAMPLES_PER_BLOCK: usize = 2048 * CHANNELS as usize;
