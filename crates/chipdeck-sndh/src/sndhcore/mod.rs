//! SNDH parsing and replay.
//!
//! ## Header format
//!
//! - Byte 0: `0x60` (BRA.s or BRA.w opcode)
//! - Bytes 12..16: `SNDH` magic
//! - Following: tag metadata until the `HDNS` end tag
//!
//! Recognized tags: `TITL` (title), `COMM` (composer), `RIPP`/`CONV`
//! (credits, skipped over), `##nn` (sub-song count, two ASCII digits),
//! `TC`/`!V` (replay rate in Hz, ASCII digits), `TIME` (big-endian u16
//! seconds per sub-song).
//!
//! ## Process-wide core
//!
//! The replay core keeps one process-wide table set, built on first
//! [`init`] and shared by every replayer instance. `init` reports a
//! failure if table construction produces an unusable result.

mod parser;
mod replay;

pub use parser::{is_sndh_data, parse, SndhTune};
pub use replay::SndhReplayer;

use std::sync::OnceLock;

use crate::error::{Result, SndhError};

/// Engine version string reported through plugin metadata.
pub const VERSION: &str = "sndhcore 0.9.3";

/// Process-wide replay tables (YM-style logarithmic volume curve).
pub(crate) struct CoreTables {
    pub(crate) volume: [f32; 16],
}

static CORE: OnceLock<std::result::Result<CoreTables, String>> = OnceLock::new();

fn build_tables() -> std::result::Result<CoreTables, String> {
    let mut volume = [0.0f32; 16];
    for (level, slot) in volume.iter_mut().enumerate() {
        // Each level is ~3 dB below the next, level 0 silent.
        *slot = if level == 0 {
            0.0
        } else {
            2f32.powf((level as f32 - 15.0) / 2.0)
        };
    }
    if volume[15] != 1.0 || volume.windows(2).any(|w| w[0] >= w[1]) {
        return Err("volume curve is not monotonic".to_string());
    }
    Ok(CoreTables { volume })
}

/// Initialize the process-wide replay core. Idempotent.
pub fn init() -> Result<()> {
    match CORE.get_or_init(build_tables) {
        Ok(_) => Ok(()),
        Err(msg) => Err(SndhError::CoreInit(msg.clone())),
    }
}

pub(crate) fn core() -> Result<&'static CoreTables> {
    match CORE.get_or_init(build_tables) {
        Ok(tables) => Ok(tables),
        Err(msg) => Err(SndhError::CoreInit(msg.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init().unwrap();
        init().unwrap();
        let tables = core().unwrap();
        assert_eq!(tables.volume[0], 0.0);
        assert_eq!(tables.volume[15], 1.0);
    }
}
