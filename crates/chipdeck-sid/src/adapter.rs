//! [`DecoderPlugin`] implementation over the sidcore engine.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::warn;

use chipdeck_common::{
    DecodeError, DecoderPlugin, OpenError, PluginContext, SetupError, SAMPLE_RATE,
};

use crate::error::SidError;
use crate::sidcore::{self, ResamplerBuilder, SamplingMethod, SidEngine, SidTune};

/// Whether a missing/truncated ROM image fails `setup()` (`true`) or is
/// logged and degraded around (`false`, the default).
pub const REQUIRE_ROMS_SETTING: &str = "sid.require-roms";

/// Sampling method name for the output resampler.
pub const SAMPLING_METHOD_SETTING: &str = "sid.sampling-method";

/// 8580 digi-boost toggle.
pub const DIGI_BOOST_SETTING: &str = "sid.digi-boost";

/// Always start on track 1 instead of the file's default tune.
pub const FORCE_FIRST_TRACK_SETTING: &str = "sid.force-first-track";

/// SID tune plugin (PSID/RSID).
///
/// Tracks are 1-based; a `set_subsong(0)` request selects the file's
/// default tune. The engine handle is shared between the audio thread and
/// the control thread, so it lives behind its own mutex with track
/// counters mirrored into atomics.
pub struct SidPlugin {
    ctx: PluginContext,
    engine: Mutex<Option<SidEngine>>,
    builder: Mutex<Option<ResamplerBuilder>>,
    roms_complete: AtomicBool,
    current_track: AtomicUsize,
    track_count: AtomicUsize,
}

impl SidPlugin {
    /// Create the plugin. Call [`DecoderPlugin::setup`] before use.
    pub fn new(ctx: PluginContext) -> Self {
        SidPlugin {
            ctx,
            engine: Mutex::new(None),
            builder: Mutex::new(None),
            roms_complete: AtomicBool::new(false),
            current_track: AtomicUsize::new(0),
            track_count: AtomicUsize::new(0),
        }
    }

    fn store_counters(&self, engine: &SidEngine) {
        self.current_track
            .store(engine.current_song(), Ordering::Release);
        self.track_count
            .store(engine.song_count(), Ordering::Release);
    }
}

impl DecoderPlugin for SidPlugin {
    fn name(&self) -> &str {
        "sid"
    }

    fn version(&self) -> String {
        sidcore::VERSION.to_string()
    }

    fn supported_extensions(&self) -> &[&str] {
        &[".sid"]
    }

    fn setup(&self) -> Result<(), SetupError> {
        let (roms, problems) = sidcore::RomSet::load(&self.ctx.data_dir);
        if !problems.is_empty() {
            if self.ctx.settings.bool_or(REQUIRE_ROMS_SETTING, false) {
                let first = &problems[0];
                return Err(SetupError::MissingResource {
                    name: "system ROM images".to_string(),
                    reason: first.to_string(),
                });
            }
            for problem in &problems {
                warn!(%problem, "proceeding with degraded ROM emulation");
            }
        }
        self.roms_complete.store(roms.is_complete(), Ordering::Release);

        let method_name = self
            .ctx
            .settings
            .str_or(SAMPLING_METHOD_SETTING, "interpolate");
        let method = SamplingMethod::from_name(&method_name).ok_or_else(|| {
            SetupError::EngineInit(format!("unknown sampling method '{method_name}'"))
        })?;

        let builder = ResamplerBuilder::new(SAMPLE_RATE).method(method);
        // Surface an unhealthy configuration now, not at first open().
        builder
            .build()
            .map_err(|e| SetupError::EngineInit(e.to_string()))?;
        *self.builder.lock() = Some(builder);
        Ok(())
    }

    fn cleanup(&self) {
        *self.builder.lock() = None;
        self.roms_complete.store(false, Ordering::Release);
    }

    fn open(&self, data: &[u8]) -> Result<(), OpenError> {
        let tune = SidTune::parse(data).map_err(|e| match e {
            SidError::TooShort { .. } | SidError::BadMagic => OpenError::Format(e.to_string()),
            other => OpenError::Load(other.to_string()),
        })?;

        let builder = (*self.builder.lock())
            .clone()
            .ok_or_else(|| OpenError::Load("plugin not set up".to_string()))?;
        let resampler = builder.build().map_err(|e| OpenError::Load(e.to_string()))?;

        let start = if self.ctx.settings.bool_or(FORCE_FIRST_TRACK_SETTING, false) {
            1
        } else {
            tune.start_song
        };
        let engine = SidEngine::new(
            tune,
            resampler,
            start,
            self.ctx.settings.bool_or(DIGI_BOOST_SETTING, false),
            self.roms_complete.load(Ordering::Acquire),
        )
        .map_err(|e| OpenError::Load(e.to_string()))?;

        self.store_counters(&engine);
        *self.engine.lock() = Some(engine);
        Ok(())
    }

    fn close(&self) {
        *self.engine.lock() = None;
        self.current_track.store(0, Ordering::Release);
        self.track_count.store(0, Ordering::Release);
    }

    fn decode(&self, out: &mut [i16]) -> Result<bool, DecodeError> {
        let mut guard = self.engine.lock();
        match guard.as_mut() {
            Some(engine) => {
                engine.clock(out);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn current_track(&self) -> usize {
        self.current_track.load(Ordering::Acquire)
    }

    fn track_count(&self) -> usize {
        self.track_count.load(Ordering::Acquire)
    }

    fn set_subsong(&self, track: usize) {
        let mut guard = self.engine.lock();
        let Some(engine) = guard.as_mut() else {
            return;
        };
        // Track 0 selects the file's default tune.
        let target = if track == 0 { engine.tune().start_song } else { track };
        if target >= 1 && target <= engine.song_count() && engine.start_song(target).is_ok() {
            self.current_track.store(target, Ordering::Release);
        }
    }

    fn render_settings(&self) -> String {
        let method = self
            .ctx
            .settings
            .str_or(SAMPLING_METHOD_SETTING, "interpolate");
        let digi = self.ctx.settings.bool_or(DIGI_BOOST_SETTING, false);
        let strict = self.ctx.settings.bool_or(REQUIRE_ROMS_SETTING, false);
        format!("sampling: {method}, digi-boost: {digi}, require-roms: {strict}")
    }

    fn render_stats(&self) -> String {
        let track = self.current_track.load(Ordering::Acquire);
        let count = self.track_count.load(Ordering::Acquire);
        if count == 0 {
            return String::new();
        }
        let roms = if self.roms_complete.load(Ordering::Acquire) {
            "full"
        } else {
            "degraded"
        };
        format!("song {track}/{count}, ROM emulation {roms}")
    }

    fn render_metadata(&self) -> String {
        match self.engine.lock().as_ref() {
            Some(engine) => {
                let tune = engine.tune();
                let kind = if tune.rsid { "RSID" } else { "PSID" };
                format!("{} - {} [{}] ({kind})", tune.author, tune.name, tune.released)
            }
            None => String::new(),
        }
    }
}
