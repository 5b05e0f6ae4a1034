//! IMA ADPCM codec, 4 bits per sample.
//!
//! Compressed tracks are a bare nibble stream, two mono samples per
//! byte (low nibble first), with predictor state carried across the
//! whole track from a zeroed start. Decoded samples are duplicated to
//! both stereo channels.

use wb_dsp::{Frame, DECODE_FRAME_FRAMES};
use wb_engine::{CompressedSource, FrameDecoder, StreamError};

const STEP_TABLE: [i32; 89] = [
    7, 8, 9, 10, 11, 12, 13, 14, 16, 17, 19, 21, 23, 25, 28, 31, 34, 37, 41, 45, 50, 55, 60, 66,
    73, 80, 88, 97, 107, 118, 130, 143, 157, 173, 190, 209, 230, 253, 279, 307, 337, 371, 408,
    449, 494, 544, 598, 658, 724, 796, 876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066,
    2272, 2499, 2749, 3024, 3327, 3660, 4026, 4428, 4871, 5358, 5894, 6484, 7132, 7845, 8630,
    9493, 10442, 11487, 12635, 13899, 15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794,
    32767,
];

const INDEX_TABLE: [i32; 16] = [-1, -1, -1, -1, 2, 4, 6, 8, -1, -1, -1, -1, 2, 4, 6, 8];

/// Predictor state for one ADPCM stream.
#[derive(Clone, Copy, Default)]
struct ChannelState {
    predictor: i32,
    step_index: i32,
}

impl ChannelState {
    fn decode_nibble(&mut self, nibble: u8) -> i16 {
        let step = STEP_TABLE[self.step_index as usize];

        let mut diff = step >> 3;
        if nibble & 1 != 0 {
            diff += step >> 2;
        }
        if nibble & 2 != 0 {
            diff += step >> 1;
        }
        if nibble & 4 != 0 {
            diff += step;
        }
        if nibble & 8 != 0 {
            self.predictor -= diff;
        } else {
            self.predictor += diff;
        }
        self.predictor = self.predictor.clamp(i16::MIN as i32, i16::MAX as i32);

        self.step_index = (self.step_index + INDEX_TABLE[nibble as usize]).clamp(0, 88);
        self.predictor as i16
    }

    fn encode_sample(&mut self, sample: i16) -> u8 {
        let step = STEP_TABLE[self.step_index as usize];
        let mut delta = sample as i32 - self.predictor;

        let mut nibble = 0u8;
        if delta < 0 {
            nibble |= 8;
            delta = -delta;
        }
        if delta >= step {
            nibble |= 4;
            delta -= step;
        }
        if delta >= step >> 1 {
            nibble |= 2;
            delta -= step >> 1;
        }
        if delta >= step >> 2 {
            nibble |= 1;
        }

        // Track the decoder's reconstruction exactly so the error
        // never accumulates.
        let mut state = *self;
        state.decode_nibble(nibble);
        *self = state;
        nibble
    }
}

/// Decoder for ADPCM-compressed tracks.
pub struct AdpcmDecoder {
    state: ChannelState,
}

impl AdpcmDecoder {
    pub fn new() -> Self {
        Self {
            state: ChannelState::default(),
        }
    }
}

impl Default for AdpcmDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder for AdpcmDecoder {
    fn decode_frame(
        &mut self,
        src: &mut dyn CompressedSource,
        out: &mut [Frame; DECODE_FRAME_FRAMES],
    ) -> Result<usize, StreamError> {
        // Two samples per byte, so half a decode-frame of input fills
        // a whole frame of output.
        let mut raw = [0u8; DECODE_FRAME_FRAMES / 2];
        let got = src.pull(&mut raw);
        for (i, &b) in raw[..got].iter().enumerate() {
            out[2 * i] = Frame::mono(self.state.decode_nibble(b & 0x0F));
            out[2 * i + 1] = Frame::mono(self.state.decode_nibble(b >> 4));
        }
        Ok(got * 2)
    }

    fn reset(&mut self) {
        self.state = ChannelState::default();
    }
}

/// Encoder counterpart, used to author compressed tracks.
pub struct AdpcmEncoder {
    state: ChannelState,
    pending: Option<u8>,
}

impl AdpcmEncoder {
    pub fn new() -> Self {
        Self {
            state: ChannelState::default(),
            pending: None,
        }
    }

    /// Encode one mono sample; yields a byte on every second call.
    pub fn push(&mut self, sample: i16) -> Option<u8> {
        let nibble = self.state.encode_sample(sample);
        match self.pending.take() {
            Some(low) => Some(low | (nibble << 4)),
            None => {
                self.pending = Some(nibble);
                None
            }
        }
    }

    /// Flush a trailing odd sample as a half-filled byte.
    pub fn finish(&mut self) -> Option<u8> {
        self.pending.take()
    }

    #[cfg(feature = "std")]
    pub fn encode(samples: &[i16]) -> std::vec::Vec<u8> {
        let mut enc = Self::new();
        let mut bytes = std::vec::Vec::with_capacity(samples.len() / 2 + 1);
        for &s in samples {
            if let Some(b) = enc.push(s) {
                bytes.push(b);
            }
        }
        if let Some(b) = enc.finish() {
            bytes.push(b);
        }
        bytes
    }
}

impl Default for AdpcmEncoder {
    fn default() -> Self {
        Self::new()
    }
}
