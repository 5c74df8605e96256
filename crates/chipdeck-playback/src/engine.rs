//! Playback engine state machine.
//!
//! States: `NoFile -> Playing <-> Paused`, plus `Playing|Paused -> NoFile`
//! through `stop()`, natural end-of-stream, or a decode error. Every
//! command runs on the control thread; audio-thread conditions arrive
//! through the mailboxes and take effect on [`PlaybackEngine::tick`].

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use chipdeck_common::{
    DecoderPlugin, Notification, PlayState, PlayStatus, TextCatalog,
};

use crate::error::Result;
use crate::registry::PluginRegistry;
use crate::render::{PlaybackEvent, RenderShared};
use crate::sink::AudioSink;

/// Control-thread notification consumer installed by the application.
pub type Notifier = Box<dyn FnMut(Notification)>;

struct Session {
    plugin: Arc<dyn DecoderPlugin>,
    plugin_name: String,
    path: String,
    status: PlayStatus,
}

/// Owns the active plugin, the audio sink and the play/pause/stop state.
///
/// Invariant, observable after every command: the engine is in
/// [`PlayStatus::NoFile`] exactly when no session (and no active plugin)
/// exists.
pub struct PlaybackEngine {
    registry: Arc<PluginRegistry>,
    catalog: Arc<TextCatalog>,
    shared: Arc<RenderShared>,
    // Keeps the armed backend (and its device handles) alive.
    _sink: Box<dyn AudioSink>,
    session: Option<Session>,
    notifier: Notifier,
}

impl PlaybackEngine {
    /// Arm `sink` with the render callback and stand up the engine.
    pub fn new(
        registry: Arc<PluginRegistry>,
        mut sink: Box<dyn AudioSink>,
        catalog: Arc<TextCatalog>,
        notifier: Notifier,
    ) -> Result<PlaybackEngine> {
        let shared = Arc::new(RenderShared::default());
        shared.set_muted(true);
        sink.start(Arc::clone(&shared))?;
        Ok(PlaybackEngine {
            registry,
            catalog,
            shared,
            _sink: sink,
            session: None,
            notifier,
        })
    }

    /// Shared render state, for driving the callback outside a real sink.
    pub fn render_shared(&self) -> Arc<RenderShared> {
        Arc::clone(&self.shared)
    }

    /// Current engine status.
    pub fn status(&self) -> PlayStatus {
        self.session
            .as_ref()
            .map_or(PlayStatus::NoFile, |s| s.status)
    }

    /// Load `data` (already acquired from `path`) and start a session.
    ///
    /// A previous session is stopped silently first: the UI sees one
    /// state change for the new file, never an intermediate `NoFile`.
    /// When no plugin matches the extension the request is a defensive
    /// no-op; the browser is expected to pre-filter. An open failure
    /// emits one error notification and leaves the engine in `NoFile`.
    pub fn load_file(&mut self, path: &Path, data: &[u8], start_track: usize, start_paused: bool) {
        // Silent stop of any previous session: no spurious notification
        // between the old file and the new one.
        self.teardown_session();

        let Some(plugin) = self.registry.find_for_path(path) else {
            warn!(path = %path.display(), "no plugin for extension, ignoring load");
            return;
        };

        if let Err(e) = plugin.open(data) {
            plugin.close();
            let text = self.catalog.text("error.open-failed");
            (self.notifier)(Notification::Error(format!(
                "{text} {}: {e}",
                path.display()
            )));
            return;
        }

        if start_track > 0 {
            plugin.set_subsong(start_track);
        }

        self.shared.install(Some(Arc::clone(&plugin)));
        self.shared.set_muted(start_paused);

        self.session = Some(Session {
            plugin_name: plugin.name().to_string(),
            path: path.display().to_string(),
            status: if start_paused {
                PlayStatus::Paused
            } else {
                PlayStatus::Playing
            },
            plugin,
        });
        self.notify_state();
    }

    /// Resume from `Paused`. No-op in any other state.
    pub fn play(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.status != PlayStatus::Paused {
            return;
        }
        session.status = PlayStatus::Playing;
        self.shared.set_muted(false);
        self.notify_state();
    }

    /// Pause from `Playing`. No-op in any other state.
    pub fn pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.status != PlayStatus::Playing {
            return;
        }
        session.status = PlayStatus::Paused;
        self.shared.set_muted(true);
        self.notify_state();
    }

    /// Stop the session, notifying with the previous adapter name/path.
    pub fn stop(&mut self) {
        if let Some((plugin_name, file_path)) = self.teardown_session() {
            (self.notifier)(Notification::Stopped {
                plugin_name,
                file_path,
            });
        }
    }

    /// Advance one sub-song, or notify `NoNextSubsong` at the boundary.
    pub fn next_subsong(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let track = session.plugin.current_track();
        let count = session.plugin.track_count();
        if count <= 1 || track >= count {
            (self.notifier)(Notification::NoNextSubsong);
            return;
        }
        self.switch_subsong(track + 1);
    }

    /// Go back one sub-song, or notify `NoPrevSubsong` at the boundary.
    pub fn prev_subsong(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let track = session.plugin.current_track();
        if track <= 1 {
            (self.notifier)(Notification::NoPrevSubsong);
            return;
        }
        self.switch_subsong(track - 1);
    }

    /// Drain both mailboxes once; the only path that turns audio-thread
    /// conditions into notifications.
    pub fn tick(&mut self) {
        if let Some(message) = self.shared.take_error() {
            self.teardown_session();
            let text = self.catalog.text("error.decode-failed");
            (self.notifier)(Notification::Error(format!("{text} {message}")));
        }

        if let Some(PlaybackEvent::StreamEnded) = self.shared.take_event() {
            debug!("stream ended on the audio thread");
            // Same handling as a user-initiated stop.
            self.stop();
        }
    }

    fn switch_subsong(&mut self, target: usize) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        // Quiesce the callback so unlocked adapters are re-primed safely.
        self.shared.set_muted(true);
        session.plugin.set_subsong(target);
        if session.status == PlayStatus::Playing {
            self.shared.set_muted(false);
        }
        self.notify_state();
    }

    /// Close the session without notifying. Returns the previous
    /// plugin name and path for the caller's notification, if any.
    fn teardown_session(&mut self) -> Option<(String, String)> {
        let session = self.session.take()?;
        self.shared.set_muted(true);
        self.shared.install(None);
        session.plugin.close();
        Some((session.plugin_name, session.path))
    }

    fn notify_state(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let state = PlayState {
            status: session.status,
            plugin_name: session.plugin_name.clone(),
            file_path: session.path.clone(),
            current_track: session.plugin.current_track(),
            track_count: session.plugin.track_count(),
        };
        (self.notifier)(Notification::PlayStateChanged(state));
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.teardown_session();
    }
}
