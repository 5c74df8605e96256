//! SID tune container parsing, ROM handling and replay.

mod engine;
mod resampler;
mod roms;
mod tune;

pub use engine::SidEngine;
pub use resampler::{Resampler, ResamplerBuilder, SamplingMethod};
pub use roms::{RomSet, BASIC_LEN, CHARGEN_LEN, KERNAL_LEN};
pub use tune::SidTune;

/// Engine version string reported through plugin metadata.
pub const VERSION: &str = "sidcore 2.1.1";
