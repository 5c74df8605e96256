//! Audio sink backends.
//!
//! The engine talks to the hardware through the [`AudioSink`] seam so the
//! state machine can be exercised headless. [`RodioSink`] is the real
//! backend: it appends a [`RenderSource`] that pulls 2048-frame blocks
//! through [`RenderShared::fill`] on rodio's playback thread. [`NullSink`]
//! arms nothing; tests invoke the callback themselves at a simulated
//! cadence.

use std::sync::Arc;
use std::time::Duration;

use rodio::{OutputStream, Sink, Source};

use chipdeck_common::{CHANNELS, SAMPLES_PER_BLOCK, SAMPLE_RATE};

use crate::error::{EngineError, Result};
use crate::render::RenderShared;

/// Hardware seam the playback engine arms once at construction.
pub trait AudioSink {
    /// Install the render callback and start pulling audio.
    fn start(&mut self, shared: Arc<RenderShared>) -> Result<()>;
}

/// Audio source feeding the device from the render callback.
///
/// Samples are produced in blocks to keep lock traffic off the per-sample
/// path: one `fill()` per 2048 frames, then the block drains sample by
/// sample.
pub struct RenderSource {
    shared: Arc<RenderShared>,
    block: Vec<i16>,
    position: usize,
}

impl RenderSource {
    /// Create a source over the shared render state.
    pub fn new(shared: Arc<RenderShared>) -> RenderSource {
        RenderSource {
            shared,
            block: vec![0; SAMPLES_PER_BLOCK],
            position: SAMPLES_PER_BLOCK, // first next() fetches a block
        }
    }
}

impl Iterator for RenderSource {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.position >= self.block.len() {
            self.shared.fill(&mut self.block);
            self.position = 0;
        }
        let sample = self.block[self.position];
        self.position += 1;
        Some(sample)
    }
}

impl Source for RenderSource {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.block.len())
    }

    fn channels(&self) -> u16 {
        CHANNELS
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        // Lives as long as the engine; silence while idle.
        None
    }
}

/// Real audio output through rodio.
pub struct RodioSink {
    // Kept alive for the engine's lifetime; dropping them stops playback.
    _device: Option<(OutputStream, Sink)>,
}

impl RodioSink {
    /// Create an unarmed sink.
    pub fn new() -> RodioSink {
        RodioSink { _device: None }
    }
}

impl Default for RodioSink {
    fn default() -> Self {
        RodioSink::new()
    }
}

impl AudioSink for RodioSink {
    fn start(&mut self, shared: Arc<RenderShared>) -> Result<()> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| EngineError::SinkUnavailable(e.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|e| EngineError::SinkUnavailable(e.to_string()))?;
        sink.append(RenderSource::new(shared));
        self._device = Some((stream, sink));
        Ok(())
    }
}

/// Sink that arms nothing; the test harness drives the callback.
#[derive(Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn start(&mut self, _shared: Arc<RenderShared>) -> Result<()> {
        Ok(())
    }
}
