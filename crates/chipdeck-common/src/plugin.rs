//! The decoder plugin capability trait.
//!
//! Every format adapter (tracker modules, console music, Atari ST demo
//! formats, SID tunes) implements [`DecoderPlugin`]. The trait is object
//! safe; the registry and playback engine only ever see
//! `Arc<dyn DecoderPlugin>`.
//!
//! # Threading
//!
//! Methods take `&self`: a plugin may be probed for track metadata from the
//! control thread while `decode()` runs on the audio-hardware thread.
//! Adapters whose engine handle is mutated from both threads guard it with
//! their own `parking_lot::Mutex` and publish track counters through
//! atomics; adapters that are only mutated while the sink is muted get away
//! with a single coarse lock. `decode()` itself must never block on disk
//! I/O and must complete well inside one buffer period.

use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::TextCatalog;
use crate::error::{DecodeError, OpenError, SetupError};
use crate::settings::Settings;

/// Read-only context handed to every plugin at construction.
///
/// Carries the persisted settings accessor, the text catalog for
/// human-readable messages, and the data directory plugins may read
/// external resources from (ROM images). Cloning is cheap; all fields are
/// shared.
#[derive(Clone)]
pub struct PluginContext {
    /// Persisted per-plugin key/value settings, consumed read-only.
    pub settings: Arc<Settings>,
    /// Localized message catalog, injected instead of process-global state.
    pub catalog: Arc<TextCatalog>,
    /// Directory external plugin resources are read from at `setup()` time.
    pub data_dir: PathBuf,
}

impl PluginContext {
    /// Build a context with empty settings/catalog rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        PluginContext {
            settings: Arc::new(Settings::default()),
            catalog: Arc::new(TextCatalog::default()),
            data_dir: data_dir.into(),
        }
    }
}

/// Uniform playback capability over one wrapped decoding engine.
///
/// A plugin is either *closed* (no engine handle, both track counters 0) or
/// *open* (handle valid, `1 <= current_track() <= track_count()` for
/// multi-track formats). `open()` may be called many times over a plugin's
/// life; callers must `close()` an open plugin first. Plugins are
/// constructed once at startup and never cloned.
pub trait DecoderPlugin: Send + Sync {
    /// Short plugin name shown in notifications ("tracker", "sid", ...).
    fn name(&self) -> &str;

    /// Version string of the wrapped decoding engine.
    fn version(&self) -> String;

    /// Dot-prefixed lowercase extensions this plugin accepts (".mod").
    fn supported_extensions(&self) -> &[&str];

    /// One-time per-process initialization (ROM images, engine globals).
    ///
    /// A failure excludes the plugin from the registry but is never fatal
    /// to the application.
    fn setup(&self) -> Result<(), SetupError>;

    /// Release engine-global resources at shutdown.
    fn cleanup(&self) {}

    /// Parse and validate `data` as this plugin's format.
    ///
    /// On success the current track is reset to the format's first track
    /// and the track count is populated. The numbering base is *not*
    /// uniform across plugins; callers must go through
    /// [`current_track`](Self::current_track) and
    /// [`track_count`](Self::track_count) instead of assuming one.
    fn open(&self, data: &[u8]) -> Result<(), OpenError>;

    /// Release the per-open engine handle and reset track counters to 0.
    ///
    /// Idempotent: closing an already-closed plugin is a no-op.
    fn close(&self);

    /// Render interleaved 16-bit stereo PCM at 48 kHz into `out`.
    ///
    /// Returns `Ok(false)` once the stream has ended and no more audio is
    /// available. Plugins whose format carries sub-tracks may silently
    /// advance to the next one instead of ending. Called only from the
    /// audio-hardware thread.
    fn decode(&self, out: &mut [i16]) -> Result<bool, DecodeError>;

    /// Currently selected track. 0 when closed.
    fn current_track(&self) -> usize;

    /// Number of tracks in the open stream. 0 when closed.
    fn track_count(&self) -> usize;

    /// Re-prime the engine for the requested track.
    ///
    /// Out-of-range requests are a defined no-op. Safe to call while
    /// `decode()` may be running on the audio thread.
    fn set_subsong(&self, track: usize);

    /// Settings view for the UI layer. Never invoked by the core.
    fn render_settings(&self) -> String {
        String::new()
    }

    /// Player statistics view for the UI layer. Never invoked by the core.
    fn render_stats(&self) -> String {
        String::new()
    }

    /// Metadata view (title/author/format) for the UI layer.
    fn render_metadata(&self) -> String {
        String::new()
    }
}
