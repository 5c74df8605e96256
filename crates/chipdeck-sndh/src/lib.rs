//! SNDH (Atari ST) decoder plugin.
//!
//! SNDH files carry tag-based metadata (`TITL`, `COMM`, `##nn` sub-song
//! count, `TC` replay rate, `TIME` durations) between a BRA-prefixed
//! header and the `HDNS` terminator. The `sndhcore` engine owns a
//! process-wide core handle initialized once at plugin `setup()`; sub-songs
//! are 1-based throughout, and end-of-stream behavior (stop after the
//! tagged duration vs. loop forever) is selected through the
//! `sndh.loop-forever` setting.

mod adapter;
mod error;
pub mod sndhcore;

pub use adapter::{SndhPlugin, LOOP_SETTING};
pub use error::SndhError;
