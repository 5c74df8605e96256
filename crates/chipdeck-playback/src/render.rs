//! The real-time decode callback.
//!
//! [`RenderShared`] is the state the audio-hardware thread shares with the
//! control thread: the active plugin slot, the mute/halt flags, and the
//! two outbound mailboxes. [`RenderShared::fill`] is the callback proper,
//! the only code the audio thread runs against the core.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use chipdeck_common::{DecoderPlugin, Mailbox};

/// Event the callback posts when playback ends on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// `decode()` reported end-of-stream; the engine must stop.
    StreamEnded,
}

/// State shared between the audio thread and the control thread.
#[derive(Default)]
pub struct RenderShared {
    /// Active plugin slot; swapped by the control thread only.
    plugin: Mutex<Option<Arc<dyn DecoderPlugin>>>,
    /// Sink muted: render silence without touching the plugin, so the
    /// control thread can re-prime unlocked adapters safely.
    muted: AtomicBool,
    /// Stream over or errored: render silence until the engine reacts.
    halted: AtomicBool,
    /// End-of-stream events towards the control thread.
    events: Mailbox<PlaybackEvent>,
    /// Decode-failure messages towards the control thread.
    errors: Mailbox<String>,
}

impl RenderShared {
    /// Fill `out` with the next block of interleaved stereo samples.
    ///
    /// Called from the audio-hardware thread at buffer cadence. Errors and
    /// end-of-stream never escape; they are converted into mailbox posts
    /// and silence.
    pub fn fill(&self, out: &mut [i16]) {
        if self.muted.load(Ordering::Acquire) || self.halted.load(Ordering::Acquire) {
            out.fill(0);
            return;
        }

        let guard = self.plugin.lock();
        let Some(plugin) = guard.as_ref() else {
            out.fill(0);
            return;
        };

        match plugin.decode(out) {
            Ok(true) => {}
            Ok(false) => {
                self.halted.store(true, Ordering::Release);
                self.events.post(PlaybackEvent::StreamEnded);
            }
            Err(e) => {
                self.halted.store(true, Ordering::Release);
                self.errors.post(e.to_string());
                out.fill(0);
            }
        }
    }

    /// Install or clear the active plugin (control thread only).
    pub(crate) fn install(&self, plugin: Option<Arc<dyn DecoderPlugin>>) {
        *self.plugin.lock() = plugin;
        self.halted.store(false, Ordering::Release);
    }

    /// Mute or unmute the render path (control thread only).
    pub(crate) fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Release);
    }

    pub(crate) fn take_event(&self) -> Option<PlaybackEvent> {
        self.events.take()
    }

    pub(crate) fn take_error(&self) -> Option<String> {
        self.errors.take()
    }
}
