//! Sample types and fixed-point DSP primitives for wavebox.
//!
//! Everything the mix path touches lives here: the stereo [`Frame`],
//! the Q1.15 block operations, the dB gain table, and the shared
//! timing/sizing constants.

#![cfg_attr(not(feature = "std"), no_std)]

mod fixed;
mod frame;
mod gain;
pub mod q15;

pub use fixed::Fx16;
pub use frame::Frame;
pub use gain::{
    db_to_index, GainTable, GAIN_STEPS, MAX_GAIN_DB, MIN_GAIN_DB, SILENCE_GAIN_INDEX,
    UNITY_GAIN_INDEX,
};

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Stereo frames produced per mix quantum.
pub const QUANTUM_FRAMES: usize = 128;

/// Nominal quantum period in milliseconds, used to normalize fade
/// deltas (128 frames at 44.1 kHz is ~2.9 ms).
pub const FADE_QUANTUM_MS: u32 = 3;

/// Bytes per storage block.
pub const BLOCK_BYTES: usize = 512;

/// Maximum stereo frames yielded by one decode call.
pub const DECODE_FRAME_FRAMES: usize = 576;
