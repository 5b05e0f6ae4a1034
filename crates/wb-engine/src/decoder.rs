//! Pull-based decoder contract and the decode-ahead driver.
//!
//! The codec never touches a ring buffer directly: it pulls compressed
//! bytes through [`CompressedSource`] and hands back decoded frames one
//! decode-frame at a time. [`decode_ahead`] keeps a voice's PCM buffer
//! topped up ahead of the mix deadline.

use core::fmt;

use wb_dsp::{Frame, DECODE_FRAME_FRAMES};

use crate::voice::Voice;

/// Bitstream failure reported by a decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamError {
    /// The bitstream is not valid for this codec.
    Malformed,
    /// The stream ended mid-frame.
    Truncated,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Malformed => write!(f, "malformed bitstream"),
            StreamError::Truncated => write!(f, "bitstream truncated mid-frame"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StreamError {}

/// Supplies compressed bytes on demand.
///
/// A pull returning fewer bytes than requested means the source is
/// (currently) dry; it is not an error.
pub trait CompressedSource {
    fn pull(&mut self, dst: &mut [u8]) -> usize;
}

impl CompressedSource for Voice {
    fn pull(&mut self, dst: &mut [u8]) -> usize {
        self.fetch_compressed(dst)
    }
}

/// One codec instance, bound to a single stream.
pub trait FrameDecoder: Send {
    /// Decode up to one decode-frame of stereo output into `out`,
    /// pulling input from `src` as needed.
    ///
    /// Returns the number of frames produced; 0 means the source could
    /// not supply enough input for a whole frame (try again after more
    /// bytes arrive, or never, at end of stream).
    fn decode_frame(
        &mut self,
        src: &mut dyn CompressedSource,
        out: &mut [Frame; DECODE_FRAME_FRAMES],
    ) -> Result<usize, StreamError>;

    /// Reset stream state for a rewind to byte 0.
    fn reset(&mut self);
}

/// Decode into `voice` until its PCM buffer is full or input runs dry.
///
/// Returns the total frames pushed. `scratch` is caller-owned so the
/// real-time side never allocates.
pub fn decode_ahead<D: FrameDecoder + ?Sized>(
    voice: &mut Voice,
    decoder: &mut D,
    scratch: &mut [Frame; DECODE_FRAME_FRAMES],
) -> Result<usize, StreamError> {
    let mut total = 0;
    while voice.has_decode_space() {
        let n = decoder.decode_frame(voice, scratch)?;
        if n == 0 {
            break;
        }
        voice.push_decoded_frames(&scratch[..n]);
        total += n;
    }
    Ok(total)
}
