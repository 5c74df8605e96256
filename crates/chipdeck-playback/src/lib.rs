//! Plugin registry and playback engine.
//!
//! This crate owns everything between the decoder plugins and the audio
//! hardware:
//!
//! - [`PluginRegistry`]: sets up the constructed plugins and excludes the
//!   ones that fail, and resolves files to plugins by extension.
//! - [`PlaybackEngine`]: the `NoFile -> Playing <-> Paused` state machine
//!   driving one active plugin and the audio sink.
//! - the two [`Mailbox`](chipdeck_common::Mailbox) slots the real-time
//!   callback uses to reach the control thread.
//! - [`AudioSink`] / [`RodioSink`] / [`NullSink`]: the hardware seam; the
//!   rodio sink pulls 2048-frame blocks through [`RenderShared`], the null
//!   sink lets tests drive the callback at a simulated cadence.
//!
//! # Threading
//!
//! The control thread issues every engine command and drains the
//! mailboxes once per tick. The audio thread only ever calls
//! [`RenderShared::fill`], which takes the bounded plugin lock and posts
//! into the mailboxes; it never dispatches notifications itself.

#![warn(missing_docs)]

mod engine;
mod error;
mod registry;
mod render;
mod sink;

pub use engine::{Notifier, PlaybackEngine};
pub use error::EngineError;
pub use registry::PluginRegistry;
pub use render::{PlaybackEvent, RenderShared};
pub use sink::{AudioSink, NullSink, RodioSink};
