//! [`DecoderPlugin`] implementation over the modplay engine.

use parking_lot::Mutex;
use tracing::debug;

use chipdeck_common::{
    DecodeError, DecoderPlugin, OpenError, PluginContext, SetupError, SAMPLE_RATE,
};

use crate::error::ModError;
use crate::modplay::{ModPlayer, Module, RenderStatus};

/// Loop behavior setting: `true` loops at the restart position forever,
/// `false` runs the song once and ends the stream.
pub const LOOP_SETTING: &str = "tracker.loop-forever";

/// ProTracker module plugin.
///
/// Single-stream format: an open module always reports track 1 of 1.
/// The engine is only ever re-primed from the control thread while the
/// sink is muted, so one coarse lock serializes all access.
pub struct TrackerPlugin {
    ctx: PluginContext,
    player: Mutex<Option<ModPlayer>>,
}

impl TrackerPlugin {
    /// Create the plugin. Call [`DecoderPlugin::setup`] before use.
    pub fn new(ctx: PluginContext) -> Self {
        TrackerPlugin {
            ctx,
            player: Mutex::new(None),
        }
    }
}

impl DecoderPlugin for TrackerPlugin {
    fn name(&self) -> &str {
        "tracker"
    }

    fn version(&self) -> String {
        crate::modplay::VERSION.to_string()
    }

    fn supported_extensions(&self) -> &[&str] {
        &[".mod", ".nst"]
    }

    fn setup(&self) -> Result<(), SetupError> {
        // No engine-global resources.
        Ok(())
    }

    fn open(&self, data: &[u8]) -> Result<(), OpenError> {
        let module = Module::parse(data).map_err(|e| match e {
            ModError::TooShort { .. } | ModError::BadSignature(_) => {
                OpenError::Format(e.to_string())
            }
            other => OpenError::Load(other.to_string()),
        })?;

        let mut player =
            ModPlayer::new(module, SAMPLE_RATE).map_err(|e| OpenError::Load(e.to_string()))?;
        player.set_loop(self.ctx.settings.bool_or(LOOP_SETTING, false));
        debug!(title = player.title(), "module opened");

        *self.player.lock() = Some(player);
        Ok(())
    }

    fn close(&self) {
        *self.player.lock() = None;
    }

    fn decode(&self, out: &mut [i16]) -> Result<bool, DecodeError> {
        let mut guard = self.player.lock();
        match guard.as_mut() {
            Some(player) => Ok(player.render(out) == RenderStatus::Running),
            None => Ok(false),
        }
    }

    fn current_track(&self) -> usize {
        usize::from(self.player.lock().is_some())
    }

    fn track_count(&self) -> usize {
        usize::from(self.player.lock().is_some())
    }

    fn set_subsong(&self, track: usize) {
        // Single stream: only a request for track 1 is in range, and
        // re-priming it means rewinding to the start.
        if track == 1 {
            if let Some(player) = self.player.lock().as_mut() {
                player.rewind();
            }
        }
    }

    fn render_settings(&self) -> String {
        let looping = self.ctx.settings.bool_or(LOOP_SETTING, false);
        format!("loop-forever: {looping}")
    }

    fn render_stats(&self) -> String {
        match self.player.lock().as_ref() {
            Some(player) => {
                let (position, row) = player.position();
                format!("position {position:02} row {row:02}")
            }
            None => String::new(),
        }
    }

    fn render_metadata(&self) -> String {
        match self.player.lock().as_ref() {
            Some(player) if !player.title().is_empty() => {
                format!("{} (ProTracker)", player.title())
            }
            Some(_) => "(untitled) (ProTracker)".to_string(),
            None => String::new(),
        }
    }
}
