//! [`DecoderPlugin`] implementation over the nsfcore engine.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use chipdeck_common::{
    DecodeError, DecoderPlugin, OpenError, PluginContext, SetupError, SAMPLE_RATE,
};

use crate::error::NsfError;
use crate::nsfcore::{NsfEmu, NsfImage};

/// Per-sub-track play length in seconds (the format stores no durations).
pub const TRACK_SECONDS_SETTING: &str = "gamemusic.track-seconds";

const DEFAULT_TRACK_SECONDS: i64 = 150;

/// Console music plugin (NSF).
///
/// The engine indexes tracks 0-based; this plugin reports them 1-based.
/// `decode()` advances to the next sub-track silently when the engine
/// reports natural end-of-track and more remain.
///
/// The engine handle is shared between the audio thread (`decode`) and the
/// control thread (`set_subsong`), so it lives behind its own mutex; track
/// counters are mirrored into atomics so metadata reads never wait on a
/// decode in progress.
pub struct GameMusicPlugin {
    ctx: PluginContext,
    engine: Mutex<Option<NsfEmu>>,
    current_track: AtomicUsize,
    track_count: AtomicUsize,
}

impl GameMusicPlugin {
    /// Create the plugin. Call [`DecoderPlugin::setup`] before use.
    pub fn new(ctx: PluginContext) -> Self {
        GameMusicPlugin {
            ctx,
            engine: Mutex::new(None),
            current_track: AtomicUsize::new(0),
            track_count: AtomicUsize::new(0),
        }
    }
}

impl DecoderPlugin for GameMusicPlugin {
    fn name(&self) -> &str {
        "gamemusic"
    }

    fn version(&self) -> String {
        crate::nsfcore::VERSION.to_string()
    }

    fn supported_extensions(&self) -> &[&str] {
        &[".nsf"]
    }

    fn setup(&self) -> Result<(), SetupError> {
        // No engine-global resources.
        Ok(())
    }

    fn open(&self, data: &[u8]) -> Result<(), OpenError> {
        let image = NsfImage::load(data).map_err(|e| match e {
            NsfError::BadMagic | NsfError::TooShort { .. } => OpenError::Format(e.to_string()),
            other => OpenError::Load(other.to_string()),
        })?;

        let track_seconds = self
            .ctx
            .settings
            .int_or(TRACK_SECONDS_SETTING, DEFAULT_TRACK_SECONDS)
            .clamp(1, 3600) as u32;
        let emu = NsfEmu::new(image, SAMPLE_RATE, track_seconds);

        self.current_track
            .store(emu.current_track() + 1, Ordering::Release);
        self.track_count.store(emu.track_count(), Ordering::Release);
        *self.engine.lock() = Some(emu);
        Ok(())
    }

    fn close(&self) {
        *self.engine.lock() = None;
        self.current_track.store(0, Ordering::Release);
        self.track_count.store(0, Ordering::Release);
    }

    fn decode(&self, out: &mut [i16]) -> Result<bool, DecodeError> {
        let mut guard = self.engine.lock();
        let Some(emu) = guard.as_mut() else {
            return Ok(false);
        };

        emu.play(out);
        if !emu.track_ended() {
            return Ok(true);
        }

        // Natural end of a sub-track: advance silently while more remain.
        let next = emu.current_track() + 1;
        if next < emu.track_count() {
            emu.start_track(next)
                .map_err(|e| DecodeError(e.to_string()))?;
            self.current_track.store(next + 1, Ordering::Release);
            debug!(track = next + 1, "advanced to next sub-track");
            return Ok(true);
        }
        Ok(false)
    }

    fn current_track(&self) -> usize {
        self.current_track.load(Ordering::Acquire)
    }

    fn track_count(&self) -> usize {
        self.track_count.load(Ordering::Acquire)
    }

    fn set_subsong(&self, track: usize) {
        let count = self.track_count.load(Ordering::Acquire);
        if track < 1 || track > count {
            return;
        }
        let mut guard = self.engine.lock();
        if let Some(emu) = guard.as_mut() {
            if emu.start_track(track - 1).is_ok() {
                self.current_track.store(track, Ordering::Release);
            }
        }
    }

    fn render_settings(&self) -> String {
        let seconds = self
            .ctx
            .settings
            .int_or(TRACK_SECONDS_SETTING, DEFAULT_TRACK_SECONDS);
        format!("track-seconds: {seconds}")
    }

    fn render_stats(&self) -> String {
        let track = self.current_track.load(Ordering::Acquire);
        let count = self.track_count.load(Ordering::Acquire);
        if count == 0 {
            String::new()
        } else {
            format!("track {track}/{count}")
        }
    }

    fn render_metadata(&self) -> String {
        match self.engine.lock().as_ref() {
            Some(emu) => {
                let image = emu.image();
                format!("{} - {} (NSF)", image.artist, image.name)
            }
            None => String::new(),
        }
    }
}
