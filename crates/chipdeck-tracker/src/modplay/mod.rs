//! Module replay engine.
//!
//! Interprets parsed ProTracker pattern data and renders it as interleaved
//! 16-bit stereo PCM. Timing follows the classic PAL scheme: 50 ticks per
//! second, `speed` ticks per row. Channels 1 and 4 pan left, 2 and 3 pan
//! right, the Amiga way.

mod format;

pub use format::{Module, Note, Pattern, CHANNEL_COUNT, HEADER_LEN, ROWS_PER_PATTERN};

use crate::error::Result;

/// Engine version string reported through plugin metadata.
pub const VERSION: &str = "modplay 0.4.2";

/// PAL Amiga clock driving period-to-frequency conversion.
const PAL_CLOCK: f32 = 7_093_789.2;

/// Row ticks per second.
const TICK_RATE: u32 = 50;

/// Outcome of one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// More audio follows.
    Running,
    /// The song has finished; the tail of the buffer is silence.
    Ended,
}

#[derive(Debug, Clone, Copy, Default)]
struct Voice {
    period: u16,
    volume: u8,
    phase: f32,
}

impl Voice {
    fn sample(&mut self, sample_rate: u32) -> f32 {
        if self.period == 0 || self.volume == 0 {
            return 0.0;
        }
        let freq = PAL_CLOCK / (f32::from(self.period) * 2.0);
        self.phase += freq / sample_rate as f32;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        let level = f32::from(self.volume) / 64.0;
        if self.phase < 0.5 { level } else { -level }
    }
}

/// ProTracker module player.
pub struct ModPlayer {
    module: Module,
    sample_rate: u32,
    loop_forever: bool,

    speed: u32,
    samples_per_tick: u32,
    tick_sample: u32,
    tick: u32,
    row: usize,
    order_pos: usize,
    row_pending: bool,
    ended: bool,
    voices: [Voice; CHANNEL_COUNT],
}

impl ModPlayer {
    /// Create a player over a parsed module.
    pub fn new(module: Module, sample_rate: u32) -> Result<ModPlayer> {
        let mut player = ModPlayer {
            module,
            sample_rate,
            loop_forever: false,
            speed: 6,
            samples_per_tick: sample_rate / TICK_RATE,
            tick_sample: 0,
            tick: 0,
            row: 0,
            order_pos: 0,
            row_pending: true,
            ended: false,
            voices: [Voice::default(); CHANNEL_COUNT],
        };
        player.rewind();
        Ok(player)
    }

    /// Select loop-forever (restart position) vs. run-once behavior.
    pub fn set_loop(&mut self, loop_forever: bool) {
        self.loop_forever = loop_forever;
    }

    /// Reset playback to the start of the song.
    pub fn rewind(&mut self) {
        self.speed = 6;
        self.tick_sample = 0;
        self.tick = 0;
        self.row = 0;
        self.order_pos = 0;
        self.row_pending = true;
        self.ended = false;
        self.voices = [Voice::default(); CHANNEL_COUNT];
    }

    /// Current (position, row) within the order table.
    pub fn position(&self) -> (usize, usize) {
        (self.order_pos, self.row)
    }

    /// Song title from the module header.
    pub fn title(&self) -> &str {
        &self.module.title
    }

    /// Render interleaved stereo samples into `out`.
    ///
    /// Fills the whole buffer; anything past the end of the song is
    /// silence and the call reports [`RenderStatus::Ended`].
    pub fn render(&mut self, out: &mut [i16]) -> RenderStatus {
        for frame in out.chunks_exact_mut(2) {
            if self.ended {
                frame[0] = 0;
                frame[1] = 0;
                continue;
            }

            if self.row_pending {
                self.row_pending = false;
                self.process_row();
            }

            let mut left = 0.0f32;
            let mut right = 0.0f32;
            for (ch, voice) in self.voices.iter_mut().enumerate() {
                let s = voice.sample(self.sample_rate);
                // Amiga panning: channels 0/3 left, 1/2 right.
                if ch == 0 || ch == 3 {
                    left += s;
                } else {
                    right += s;
                }
            }
            frame[0] = (left * 12_000.0).clamp(-32_768.0, 32_767.0) as i16;
            frame[1] = (right * 12_000.0).clamp(-32_768.0, 32_767.0) as i16;

            self.advance_clock();
        }

        if self.ended {
            RenderStatus::Ended
        } else {
            RenderStatus::Running
        }
    }

    fn advance_clock(&mut self) {
        self.tick_sample += 1;
        if self.tick_sample < self.samples_per_tick {
            return;
        }
        self.tick_sample = 0;
        self.tick += 1;
        if self.tick < self.speed {
            return;
        }
        self.tick = 0;
        self.advance_row();
    }

    fn advance_row(&mut self) {
        self.row += 1;
        if self.row >= ROWS_PER_PATTERN {
            self.row = 0;
            self.advance_order();
        }
        self.row_pending = !self.ended;
    }

    fn advance_order(&mut self) {
        self.order_pos += 1;
        if self.order_pos >= self.module.song_length {
            if self.loop_forever {
                self.order_pos = self.module.restart;
            } else {
                self.ended = true;
            }
        }
    }

    fn process_row(&mut self) {
        let pattern_index = self.module.orders[self.order_pos] as usize;
        let cells = self.module.patterns[pattern_index].rows[self.row];

        let mut jump_to: Option<usize> = None;
        let mut break_row: Option<usize> = None;

        for (ch, cell) in cells.iter().enumerate() {
            if cell.sample != 0 {
                self.voices[ch].volume = self.module.sample_volume(cell.sample);
            }
            if cell.period != 0 {
                self.voices[ch].period = cell.period;
                self.voices[ch].phase = 0.0;
            }
            match cell.effect {
                0x0C => self.voices[ch].volume = cell.argument.min(64),
                0x0F if cell.argument > 0 && cell.argument < 0x20 => {
                    self.speed = u32::from(cell.argument);
                }
                0x0B => jump_to = Some(cell.argument as usize),
                0x0D => {
                    let arg = cell.argument;
                    let row = (arg >> 4) as usize * 10 + (arg & 0x0F) as usize;
                    break_row = Some(row.min(ROWS_PER_PATTERN - 1));
                }
                _ => {}
            }
        }

        if let Some(target) = jump_to {
            if target >= self.module.song_length {
                self.ended = !self.loop_forever;
                self.order_pos = if self.loop_forever { self.module.restart } else { self.order_pos };
            } else if target <= self.order_pos && !self.loop_forever {
                // A backwards jump is the song looping; honor run-once mode.
                self.ended = true;
            } else {
                self.order_pos = target;
            }
            self.row = break_row.unwrap_or(0);
            self.tick = 0;
            self.row_pending = !self.ended;
        } else if let Some(row) = break_row {
            self.advance_order();
            self.row = row;
            self.tick = 0;
            self.row_pending = !self.ended;
        }
    }
}
