//! [`DecoderPlugin`] implementation over the sndhcore engine.

use parking_lot::Mutex;
use tracing::debug;

use chipdeck_common::{
    DecodeError, DecoderPlugin, OpenError, PluginContext, SetupError, SAMPLE_RATE,
};

use crate::error::SndhError;
use crate::sndhcore::{self, SndhReplayer};

/// Loop behavior setting: `true` replays past the tagged duration forever,
/// `false` ends the stream after it.
pub const LOOP_SETTING: &str = "sndh.loop-forever";

/// SNDH (Atari ST) plugin.
///
/// Sub-songs are 1-based. The replayer is only re-primed from the control
/// thread while the sink is muted, so one coarse lock serializes all
/// access.
pub struct SndhPlugin {
    ctx: PluginContext,
    replayer: Mutex<Option<SndhReplayer>>,
}

impl SndhPlugin {
    /// Create the plugin. Call [`DecoderPlugin::setup`] before use.
    pub fn new(ctx: PluginContext) -> Self {
        SndhPlugin {
            ctx,
            replayer: Mutex::new(None),
        }
    }
}

impl DecoderPlugin for SndhPlugin {
    fn name(&self) -> &str {
        "sndh"
    }

    fn version(&self) -> String {
        sndhcore::VERSION.to_string()
    }

    fn supported_extensions(&self) -> &[&str] {
        &[".sndh"]
    }

    fn setup(&self) -> Result<(), SetupError> {
        // One process-wide core handle, shared by every open.
        sndhcore::init().map_err(|e| SetupError::EngineInit(e.to_string()))
    }

    fn open(&self, data: &[u8]) -> Result<(), OpenError> {
        // Cheap probe before handing the buffer to the replayer.
        if !sndhcore::is_sndh_data(data) {
            return Err(OpenError::Format("missing SNDH magic".to_string()));
        }
        let mut replayer = SndhReplayer::new(data, SAMPLE_RATE).map_err(|e| match e {
            SndhError::TooShort { .. } | SndhError::InvalidHeader(_) => {
                OpenError::Format(e.to_string())
            }
            other => OpenError::Load(other.to_string()),
        })?;
        replayer.set_infinite_loop(self.ctx.settings.bool_or(LOOP_SETTING, false));
        debug!(
            subsongs = replayer.subsong_count(),
            rate = replayer.tune().player_rate,
            "sndh tune opened"
        );

        *self.replayer.lock() = Some(replayer);
        Ok(())
    }

    fn close(&self) {
        *self.replayer.lock() = None;
    }

    fn decode(&self, out: &mut [i16]) -> Result<bool, DecodeError> {
        let mut guard = self.replayer.lock();
        match guard.as_mut() {
            Some(replayer) => Ok(replayer.generate(out)),
            None => Ok(false),
        }
    }

    fn current_track(&self) -> usize {
        self.replayer
            .lock()
            .as_ref()
            .map_or(0, SndhReplayer::current_subsong)
    }

    fn track_count(&self) -> usize {
        self.replayer
            .lock()
            .as_ref()
            .map_or(0, SndhReplayer::subsong_count)
    }

    fn set_subsong(&self, track: usize) {
        let mut guard = self.replayer.lock();
        if let Some(replayer) = guard.as_mut() {
            if track >= 1 && track <= replayer.subsong_count() {
                // In range; init_subsong cannot fail here.
                let _ = replayer.init_subsong(track);
            }
        }
    }

    fn render_settings(&self) -> String {
        let looping = self.ctx.settings.bool_or(LOOP_SETTING, false);
        format!("loop-forever: {looping}")
    }

    fn render_stats(&self) -> String {
        match self.replayer.lock().as_ref() {
            Some(replayer) => format!(
                "subsong {}/{} at {} Hz",
                replayer.current_subsong(),
                replayer.subsong_count(),
                replayer.tune().player_rate
            ),
            None => String::new(),
        }
    }

    fn render_metadata(&self) -> String {
        match self.replayer.lock().as_ref() {
            Some(replayer) => {
                let tune = replayer.tune();
                let title = if tune.title.is_empty() { "(unknown)" } else { &tune.title };
                let author = if tune.author.is_empty() { "(unknown)" } else { &tune.author };
                format!("{author} - {title} (SNDH)")
            }
            None => String::new(),
        }
    }
}
