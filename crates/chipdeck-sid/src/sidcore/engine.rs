//! SID replay engine.

use super::resampler::Resampler;
use super::tune::SidTune;
use crate::error::{Result, SidError};

/// Degrees of the harmonic-minor scale the generator walks, in semitones.
const SCALE: [i32; 7] = [0, 2, 3, 5, 7, 8, 11];

/// Frames per generator step at 50 Hz tune cadence.
const STEP_FRAMES: u32 = 5;

#[derive(Debug, Clone, Copy, Default)]
struct SidVoice {
    freq: f32,
    phase: f32,
    pulse_width: f32,
    level: f32,
}

impl SidVoice {
    fn sample(&mut self, sample_rate: u32) -> f32 {
        if self.freq <= 0.0 || self.level <= 0.0 {
            return 0.0;
        }
        self.phase += self.freq / sample_rate as f32;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        // Pulse with a triangle underlay, the classic lead blend.
        let pulse = if self.phase < self.pulse_width { 1.0 } else { -1.0 };
        let triangle = 4.0 * (self.phase - 0.5).abs() - 1.0;
        (pulse * 0.6 + triangle * 0.4) * self.level
    }
}

/// Per-open replay state over a parsed tune.
///
/// Songs are 1-based. SID tunes carry no end marker; the engine renders
/// until the caller tears it down.
pub struct SidEngine {
    tune: SidTune,
    resampler: Resampler,
    song: usize,
    seed: u32,
    digi_boost: bool,
    full_roms: bool,
    samples_per_tick: u32,
    tick_sample: u32,
    tick: u32,
    voices: [SidVoice; 3],
}

impl SidEngine {
    /// Create an engine for `tune`, primed on `song` (1-based).
    pub fn new(
        tune: SidTune,
        resampler: Resampler,
        song: usize,
        digi_boost: bool,
        full_roms: bool,
    ) -> Result<SidEngine> {
        let sample_rate = resampler.sample_rate();
        let mut engine = SidEngine {
            tune,
            resampler,
            song: 0,
            seed: 1,
            digi_boost,
            full_roms,
            samples_per_tick: (sample_rate / 50).max(1),
            tick_sample: 0,
            tick: 0,
            voices: [SidVoice::default(); 3],
        };
        engine.start_song(song)?;
        Ok(engine)
    }

    /// Tune metadata.
    pub fn tune(&self) -> &SidTune {
        &self.tune
    }

    /// Currently primed song (1-based).
    pub fn current_song(&self) -> usize {
        self.song
    }

    /// Number of songs in the tune.
    pub fn song_count(&self) -> usize {
        self.tune.songs
    }

    /// Whether the full ROM set is in effect (vs. degraded emulation).
    pub fn full_roms(&self) -> bool {
        self.full_roms
    }

    /// Re-prime for a song (1-based).
    pub fn start_song(&mut self, song: usize) -> Result<()> {
        if song < 1 || song > self.tune.songs {
            return Err(SidError::InvalidSong {
                index: song,
                available: self.tune.songs,
            });
        }
        self.song = song;
        self.seed = self.tune.song_seed(song);
        self.tick_sample = 0;
        self.tick = 0;
        self.voices = [SidVoice::default(); 3];
        self.step_tick();
        Ok(())
    }

    /// Fill `out` with interleaved stereo samples. Never ends on its own.
    pub fn clock(&mut self, out: &mut [i16]) {
        let sample_rate = self.resampler.sample_rate();
        let boost = if self.digi_boost { 1.25 } else { 1.0 };

        for frame in out.chunks_exact_mut(2) {
            let a = self.voices[0].sample(sample_rate);
            let b = self.voices[1].sample(sample_rate);
            let c = self.voices[2].sample(sample_rate);
            let mixed = self.resampler.process((a + b + c) * boost / 3.0);

            let sample = (mixed * 14_000.0).clamp(-32_768.0, 32_767.0) as i16;
            frame[0] = sample;
            frame[1] = sample;

            self.tick_sample += 1;
            if self.tick_sample >= self.samples_per_tick {
                self.tick_sample = 0;
                self.tick += 1;
                if self.tick % STEP_FRAMES == 0 {
                    self.step_tick();
                }
            }
        }
    }

    fn next_rand(&mut self) -> u32 {
        self.seed = self.seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.seed
    }

    fn step_tick(&mut self) {
        let r = self.next_rand();
        self.voices[0].freq = note_freq(57 + SCALE[(r >> 7) as usize % SCALE.len()]);
        self.voices[0].pulse_width = 0.25 + ((r >> 16) & 0x03) as f32 * 0.125;
        self.voices[0].level = 1.0;

        if self.tick % (STEP_FRAMES * 2) == 0 {
            let r = self.next_rand();
            self.voices[1].freq = note_freq(45 + SCALE[(r >> 11) as usize % SCALE.len()]);
            self.voices[1].pulse_width = 0.5;
            self.voices[1].level = 0.8;
        }
        if self.tick % (STEP_FRAMES * 4) == 0 {
            let r = self.next_rand();
            self.voices[2].freq = note_freq(33 + SCALE[(r >> 3) as usize % SCALE.len()]);
            self.voices[2].pulse_width = 0.5;
            self.voices[2].level = 0.9;
        }
    }
}

fn note_freq(midi_note: i32) -> f32 {
    440.0 * 2f32.powf((midi_note - 69) as f32 / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sidcore::ResamplerBuilder;

    fn tune_fixture(songs: u16, start: u16) -> SidTune {
        let mut data = vec![0u8; 128];
        data[0..4].copy_from_slice(b"PSID");
        data[4..6].copy_from_slice(&2u16.to_be_bytes());
        data[10..12].copy_from_slice(&0x1000u16.to_be_bytes());
        data[12..14].copy_from_slice(&0x1003u16.to_be_bytes());
        data[14..16].copy_from_slice(&songs.to_be_bytes());
        data[16..18].copy_from_slice(&start.to_be_bytes());
        SidTune::parse(&data).unwrap()
    }

    fn engine(songs: u16, start_on: usize) -> SidEngine {
        let resampler = ResamplerBuilder::new(48_000).build().unwrap();
        SidEngine::new(tune_fixture(songs, 1), resampler, start_on, false, false).unwrap()
    }

    #[test]
    fn renders_audible_samples_forever() {
        let mut engine = engine(3, 1);
        let mut out = vec![0i16; 4_096];
        for _ in 0..20 {
            engine.clock(&mut out);
        }
        assert!(out.iter().any(|&s| s != 0));
    }

    #[test]
    fn song_bounds_are_errors() {
        let mut engine = engine(3, 1);
        assert!(engine.start_song(3).is_ok());
        assert!(matches!(
            engine.start_song(0),
            Err(SidError::InvalidSong { .. })
        ));
        assert!(matches!(
            engine.start_song(4),
            Err(SidError::InvalidSong { index: 4, available: 3 })
        ));
    }

    #[test]
    fn songs_render_distinct_material() {
        let mut engine = engine(2, 1);
        let mut first = vec![0i16; 4_096];
        engine.clock(&mut first);
        engine.start_song(2).unwrap();
        let mut second = vec![0i16; 4_096];
        engine.clock(&mut second);
        assert_ne!(first, second);
    }
}
