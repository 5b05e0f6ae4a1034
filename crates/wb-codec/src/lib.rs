//! Track codecs: raw PCM passthrough and IMA ADPCM.
//!
//! Both implement the engine's [`FrameDecoder`](wb_engine::FrameDecoder)
//! contract, pulling compressed bytes on demand and emitting stereo
//! frames one decode-frame at a time.

#![cfg_attr(not(feature = "std"), no_std)]

mod adpcm;
mod pcm;

pub use adpcm::{AdpcmDecoder, AdpcmEncoder};
pub use pcm::PcmDecoder;
