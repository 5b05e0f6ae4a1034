//! Raw PCM passthrough "codec".
//!
//! Tracks stored as interleaved 16-bit little-endian stereo pass
//! through unchanged; the only work is byte assembly across pulls that
//! land mid-frame.

use wb_dsp::{Frame, DECODE_FRAME_FRAMES};
use wb_engine::{CompressedSource, FrameDecoder, StreamError};

const BYTES_PER_FRAME: usize = 4;

/// Decoder for uncompressed stereo tracks.
pub struct PcmDecoder {
    // Partial frame bytes left over from a pull that did not land on a
    // frame boundary.
    carry: [u8; BYTES_PER_FRAME],
    carry_len: usize,
}

impl PcmDecoder {
    pub fn new() -> Self {
        Self {
            carry: [0; BYTES_PER_FRAME],
            carry_len: 0,
        }
    }
}

impl Default for PcmDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder for PcmDecoder {
    fn decode_frame(
        &mut self,
        src: &mut dyn CompressedSource,
        out: &mut [Frame; DECODE_FRAME_FRAMES],
    ) -> Result<usize, StreamError> {
        let mut raw = [0u8; DECODE_FRAME_FRAMES * BYTES_PER_FRAME];
        raw[..self.carry_len].copy_from_slice(&self.carry[..self.carry_len]);
        let pulled = src.pull(&mut raw[self.carry_len..]);
        let avail = self.carry_len + pulled;

        let frames = avail / BYTES_PER_FRAME;
        let rem = avail % BYTES_PER_FRAME;
        self.carry[..rem].copy_from_slice(&raw[avail - rem..avail]);
        self.carry_len = rem;

        for (i, f) in out[..frames].iter_mut().enumerate() {
            let b = &raw[i * BYTES_PER_FRAME..(i + 1) * BYTES_PER_FRAME];
            f.left = i16::from_le_bytes([b[0], b[1]]);
            f.right = i16::from_le_bytes([b[2], b[3]]);
        }
        Ok(frames)
    }

    fn reset(&mut self) {
        self.carry_len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out a byte slice in pulls capped at `chunk` bytes.
    struct SliceSource<'a> {
        data: &'a [u8],
        pos: usize,
        chunk: usize,
    }

    impl CompressedSource for SliceSource<'_> {
        fn pull(&mut self, dst: &mut [u8]) -> usize {
            let n = dst
                .len()
                .min(self.chunk)
                .min(self.data.len() - self.pos);
            dst[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            n
        }
    }

    fn encode_frames(frames: &[Frame]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for f in frames {
            bytes.extend_from_slice(&f.left.to_le_bytes());
            bytes.extend_from_slice(&f.right.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn decodes_interleaved_stereo() {
        let frames: Vec<Frame> = (0..100)
            .map(|i| Frame {
                left: i as i16 * 300,
                right: -(i as i16) * 300,
            })
            .collect();
        let bytes = encode_frames(&frames);
        let mut src = SliceSource {
            data: &bytes,
            pos: 0,
            chunk: usize::MAX,
        };
        let mut dec = PcmDecoder::new();
        let mut out = [Frame::silence(); DECODE_FRAME_FRAMES];
        let n = dec.decode_frame(&mut src, &mut out).unwrap();
        assert_eq!(n, 100);
        assert_eq!(&out[..100], frames.as_slice());
    }

    #[test]
    fn carries_partial_frames_across_pulls() {
        let frames: Vec<Frame> = (0..50).map(|i| Frame::mono(i as i16 * 123)).collect();
        let bytes = encode_frames(&frames);
        // 7-byte pulls never align with the 4-byte frame size.
        let mut src = SliceSource {
            data: &bytes,
            pos: 0,
            chunk: 7,
        };
        let mut dec = PcmDecoder::new();
        let mut out = [Frame::silence(); DECODE_FRAME_FRAMES];
        let mut decoded = Vec::new();
        loop {
            let n = dec.decode_frame(&mut src, &mut out).unwrap();
            if n == 0 {
                break;
            }
            decoded.extend_from_slice(&out[..n]);
        }
        assert_eq!(decoded, frames);
    }

    #[test]
    fn dry_source_produces_nothing() {
        let mut src = SliceSource {
            data: &[],
            pos: 0,
            chunk: 16,
        };
        let mut dec = PcmDecoder::new();
        let mut out = [Frame::silence(); DECODE_FRAME_FRAMES];
        assert_eq!(dec.decode_frame(&mut src, &mut out).unwrap(), 0);
    }
}
