//! Voice streaming and mixing core for wavebox.
//!
//! Each voice pulls compressed audio through a pair of ring buffers
//! (storage blocks in, decoded PCM out), decoding ahead of the mix
//! deadline, while the mixer accumulates every playing voice into one
//! output quantum with sample-accurate gain ramping.

#![cfg_attr(not(feature = "std"), no_std)]

mod decoder;
mod fader;
mod mixer;
mod ring;
mod voice;
mod voice_pool;

pub use decoder::{decode_ahead, CompressedSource, FrameDecoder, StreamError};
pub use fader::{Fader, ShortFade};
pub use mixer::Mixer;
pub use ring::RingBuffer;
pub use voice::{QuantumResult, Voice, VoiceState};
pub use voice_pool::{VoiceId, VoicePool, MAX_VOICES};

use wb_dsp::{BLOCK_BYTES, DECODE_FRAME_FRAMES};

/// Compressed ring buffer capacity: two storage blocks of read-ahead
/// plus slack so the strict space check always admits a full block.
pub const COMPRESSED_BUF_BYTES: usize = 2 * BLOCK_BYTES + BLOCK_BYTES / 2;

/// Decoded ring buffer capacity in stereo frames: four decode frames
/// of look-ahead plus slack.
pub const PCM_BUF_FRAMES: usize = 4 * DECODE_FRAME_FRAMES + DECODE_FRAME_FRAMES / 2;
