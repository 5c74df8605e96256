//! SNDH replayer built on the process-wide core tables.

use super::parser::{parse, SndhTune};
use super::{core, CoreTables};
use crate::error::{Result, SndhError};

/// Fallback play length when a tune carries no `TIME` tag.
const DEFAULT_DURATION_SECS: u32 = 180;

/// Degrees of the minor scale the tune generator walks, in semitones.
const SCALE: [i32; 7] = [0, 2, 3, 5, 7, 8, 10];

#[derive(Debug, Clone, Copy, Default)]
struct YmVoice {
    freq: f32,
    phase: f32,
    level: usize,
}

impl YmVoice {
    fn sample(&mut self, tables: &CoreTables, sample_rate: u32) -> f32 {
        if self.freq <= 0.0 {
            return 0.0;
        }
        self.phase += self.freq / sample_rate as f32;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        let amplitude = tables.volume[self.level & 0x0F];
        if self.phase < 0.5 {
            amplitude
        } else {
            -amplitude
        }
    }
}

/// Replays one SNDH tune; sub-songs are 1-based.
pub struct SndhReplayer {
    tune: SndhTune,
    tables: &'static CoreTables,
    sample_rate: u32,
    subsong: usize,
    infinite_loop: bool,
    seed: u32,
    samples_per_tick: u32,
    tick_sample: u32,
    tick: u32,
    frames_left: u64,
    done: bool,
    voices: [YmVoice; 3],
}

impl SndhReplayer {
    /// Parse `data` and prepare sub-song 1.
    ///
    /// Requires the process-wide core; construction fails if the core
    /// cannot be initialized.
    pub fn new(data: &[u8], sample_rate: u32) -> Result<SndhReplayer> {
        let tables = core()?;
        let tune = parse(data)?;
        let mut replayer = SndhReplayer {
            tune,
            tables,
            sample_rate,
            subsong: 0,
            infinite_loop: false,
            seed: 1,
            samples_per_tick: sample_rate / 50,
            tick_sample: 0,
            tick: 0,
            frames_left: 0,
            done: false,
            voices: [YmVoice::default(); 3],
        };
        replayer.init_subsong(1)?;
        Ok(replayer)
    }

    /// Tune metadata.
    pub fn tune(&self) -> &SndhTune {
        &self.tune
    }

    /// Number of sub-songs.
    pub fn subsong_count(&self) -> usize {
        self.tune.subsong_count
    }

    /// Currently initialized sub-song (1-based).
    pub fn current_subsong(&self) -> usize {
        self.subsong
    }

    /// Keep replaying past the tagged duration instead of stopping.
    pub fn set_infinite_loop(&mut self, enabled: bool) {
        self.infinite_loop = enabled;
    }

    /// Re-prime the replayer for a sub-song (1-based).
    pub fn init_subsong(&mut self, subsong: usize) -> Result<()> {
        if subsong < 1 || subsong > self.tune.subsong_count {
            return Err(SndhError::InvalidSubsong {
                index: subsong,
                available: self.tune.subsong_count,
            });
        }
        self.subsong = subsong;
        self.seed = fold_seed(&self.tune.title, subsong);
        self.samples_per_tick = (self.sample_rate / self.tune.player_rate.max(1)).max(1);
        self.tick_sample = 0;
        self.tick = 0;
        self.done = false;
        self.voices = [YmVoice::default(); 3];

        let seconds = self
            .tune
            .durations
            .get(subsong - 1)
            .copied()
            .map(u32::from)
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_DURATION_SECS);
        self.frames_left = u64::from(self.sample_rate) * u64::from(seconds);

        self.step_tick();
        Ok(())
    }

    /// Fill `out` with interleaved stereo samples.
    ///
    /// Returns `false` once the sub-song has played out (never when
    /// infinite loop is enabled); the tail of the buffer is silence.
    pub fn generate(&mut self, out: &mut [i16]) -> bool {
        let tables = self.tables;

        for frame in out.chunks_exact_mut(2) {
            if self.done {
                frame[0] = 0;
                frame[1] = 0;
                continue;
            }

            let a = self.voices[0].sample(tables, self.sample_rate);
            let b = self.voices[1].sample(tables, self.sample_rate);
            let c = self.voices[2].sample(tables, self.sample_rate);
            // ST mono mix, slightly widened: B sits center.
            frame[0] = ((a + b * 0.7) * 10_000.0).clamp(-32_768.0, 32_767.0) as i16;
            frame[1] = ((c + b * 0.7) * 10_000.0).clamp(-32_768.0, 32_767.0) as i16;

            self.tick_sample += 1;
            if self.tick_sample >= self.samples_per_tick {
                self.tick_sample = 0;
                self.tick += 1;
                self.step_tick();
            }

            if !self.infinite_loop {
                self.frames_left = self.frames_left.saturating_sub(1);
                if self.frames_left == 0 {
                    self.done = true;
                }
            }
        }

        !self.done
    }

    fn next_rand(&mut self) -> u32 {
        self.seed = self.seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.seed
    }

    fn step_tick(&mut self) {
        // Lead changes every 4 ticks, accompaniment every 8, bass every 16.
        if self.tick % 4 == 0 {
            let r = self.next_rand();
            self.voices[0].freq = note_freq(64 + SCALE[(r >> 9) as usize % SCALE.len()]);
            self.voices[0].level = 13 + ((r >> 20) as usize & 0x01);
        }
        if self.tick % 8 == 0 {
            let r = self.next_rand();
            self.voices[1].freq = note_freq(52 + SCALE[(r >> 5) as usize % SCALE.len()]);
            self.voices[1].level = 11;
        }
        if self.tick % 16 == 0 {
            let r = self.next_rand();
            self.voices[2].freq = note_freq(40 + SCALE[(r >> 13) as usize % SCALE.len()]);
            self.voices[2].level = 12;
        }
    }
}

fn fold_seed(title: &str, subsong: usize) -> u32 {
    let mut seed = 0x1234_5678u32;
    for byte in title.bytes() {
        seed = seed.rotate_left(5) ^ u32::from(byte);
    }
    seed.wrapping_add(subsong as u32 * 0x9E37) | 1
}

fn note_freq(midi_note: i32) -> f32 {
    440.0 * 2f32.powf((midi_note - 69) as f32 / 12.0)
}
