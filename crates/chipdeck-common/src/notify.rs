//! Messages crossing the core boundary.
//!
//! The browser collaborator sends [`LoadRequest`]s in; the core publishes
//! [`Notification`]s out. Notifications originating on the audio-hardware
//! thread are marshaled through the playback crate's mailboxes and only
//! dispatched by the control thread.

use std::path::PathBuf;
use std::sync::Arc;

/// Opaque UI render callback bound to a specific plugin instance.
///
/// Published once at registry configuration; the core never invokes these.
pub type RenderFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Playback status of the engine's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayStatus {
    /// No file loaded; no active plugin.
    #[default]
    NoFile,
    /// Decoding and audible.
    Playing,
    /// Session open, sink muted.
    Paused,
}

/// Snapshot of the playback session carried by state-change notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayState {
    /// Current engine status.
    pub status: PlayStatus,
    /// Name of the active plugin.
    pub plugin_name: String,
    /// Path of the loaded file.
    pub file_path: String,
    /// Selected track as reported by the plugin.
    pub current_track: usize,
    /// Total tracks as reported by the plugin.
    pub track_count: usize,
}

/// Registry entry published to the UI layer for one active plugin.
///
/// Immutable once published.
#[derive(Clone)]
pub struct PluginInformation {
    /// Plugin name.
    pub name: String,
    /// Wrapped engine version string.
    pub version: String,
    /// Supported dotted extensions.
    pub extensions: Vec<String>,
    /// Settings view callback.
    pub settings_view: RenderFn,
    /// Player statistics view callback.
    pub stats_view: RenderFn,
    /// Metadata view callback.
    pub metadata_view: RenderFn,
}

impl std::fmt::Debug for PluginInformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInformation")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

/// Notification published by the core towards the UI collaborator.
#[derive(Debug, Clone)]
pub enum Notification {
    /// Startup: the active plugin set and its capability handles.
    RegistryConfigured(Vec<PluginInformation>),
    /// Playback entered or changed a Playing/Paused state.
    PlayStateChanged(PlayState),
    /// Playback stopped; carries the *previous* session for UI display.
    Stopped {
        /// Plugin that was active before the stop.
        plugin_name: String,
        /// File that was loaded before the stop.
        file_path: String,
    },
    /// Next-subsong requested at the last track: nothing changed.
    NoNextSubsong,
    /// Previous-subsong requested at the first track: nothing changed.
    NoPrevSubsong,
    /// A failure that prevented playback, as a human-readable message.
    Error(String),
}

/// A request to acquire and play a file, issued by the browser collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// File to load.
    pub path: PathBuf,
    /// Track to start on (plugin-numbering; 0 lets the plugin choose).
    pub start_track: usize,
    /// Whether the session should start muted in the Paused state.
    pub start_paused: bool,
}

impl LoadRequest {
    /// Request playback of `path` from its first track, unpaused.
    pub fn play(path: impl Into<PathBuf>) -> Self {
        LoadRequest {
            path: path.into(),
            start_track: 0,
            start_paused: false,
        }
    }
}
