//! One playback slot: buffering, playback state, and per-quantum
//! rendering.
//!
//! A voice owns a compressed byte ring fed from storage and a decoded
//! frame ring fed by the decoder. The producer-side operations here are
//! called from the storage-feed step; `render_quantum` is the only
//! method touched by the real-time mix path.

use wb_dsp::{
    q15, Frame, GainTable, BLOCK_BYTES, QUANTUM_FRAMES, SILENCE_GAIN_INDEX, UNITY_GAIN_INDEX,
};

use crate::fader::{Fader, ShortFade};
use crate::ring::RingBuffer;
use crate::{COMPRESSED_BUF_BYTES, PCM_BUF_FRAMES};

/// Playback lifecycle of a voice slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoiceState {
    #[default]
    Available,
    Playing,
    Paused,
    Stopped,
}

/// Outcome of rendering one quantum for a voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantumResult {
    /// Scratch holds a full quantum; the voice keeps playing.
    Mixed,
    /// Scratch holds the voice's final audible quantum; the voice is
    /// now stopped.
    MixedLast,
    /// Nothing was rendered; the voice finalized before producing
    /// output this quantum.
    Finished,
}

/// A single playback slot.
pub struct Voice {
    state: VoiceState,
    looping: bool,
    locked: bool,
    stop_requested: bool,
    eof: bool,
    stream_error: bool,
    compressed: RingBuffer<u8, COMPRESSED_BUF_BYTES>,
    pcm: RingBuffer<Frame, PCM_BUF_FRAMES>,
    bytes_from_storage: u32,
    bytes_to_decoder: u32,
    frames_played: u64,
    gain_index: u8,
    linear_gain: i16,
    fader: Fader,
    track_size: u32,
    track_index: usize,
    trigger_quantum: u64,
}

impl Voice {
    pub fn new() -> Self {
        Self {
            state: VoiceState::Available,
            looping: false,
            locked: false,
            stop_requested: false,
            eof: false,
            stream_error: false,
            compressed: RingBuffer::new(),
            pcm: RingBuffer::new(),
            bytes_from_storage: 0,
            bytes_to_decoder: 0,
            frames_played: 0,
            gain_index: SILENCE_GAIN_INDEX,
            linear_gain: 0,
            fader: Fader::default(),
            track_size: 0,
            track_index: 0,
            trigger_quantum: 0,
        }
    }

    /// Claim this slot for a track and enter Playing.
    pub fn activate(
        &mut self,
        track_index: usize,
        track_size: u32,
        looping: bool,
        locked: bool,
        gain_index: u8,
        table: &GainTable,
    ) {
        self.reset();
        self.state = VoiceState::Playing;
        self.track_index = track_index;
        self.track_size = track_size;
        self.looping = looping;
        self.locked = locked;
        self.gain_index = gain_index;
        self.linear_gain = table.index_to_linear(gain_index);
    }

    /// Return the slot to Available with zeroed buffers and counters.
    pub fn reset(&mut self) {
        self.state = VoiceState::Available;
        self.looping = false;
        self.locked = false;
        self.stop_requested = false;
        self.eof = false;
        self.stream_error = false;
        self.compressed.clear();
        self.pcm.clear();
        self.bytes_from_storage = 0;
        self.bytes_to_decoder = 0;
        self.frames_played = 0;
        self.gain_index = SILENCE_GAIN_INDEX;
        self.linear_gain = 0;
        self.fader.cancel();
        self.track_size = 0;
        self.track_index = 0;
        self.trigger_quantum = 0;
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == VoiceState::Playing
    }

    pub fn track_index(&self) -> usize {
        self.track_index
    }

    pub fn track_size(&self) -> u32 {
        self.track_size
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn end_of_file(&self) -> bool {
        self.eof
    }

    pub fn gain_index(&self) -> u8 {
        self.gain_index
    }

    pub fn frames_played(&self) -> u64 {
        self.frames_played
    }

    pub fn bytes_from_storage(&self) -> u32 {
        self.bytes_from_storage
    }

    pub fn bytes_to_decoder(&self) -> u32 {
        self.bytes_to_decoder
    }

    /// Quantum count at the moment the voice was opened, recorded by
    /// the controller for age-ordering queries.
    pub fn trigger_quantum(&self) -> u64 {
        self.trigger_quantum
    }

    pub fn set_trigger_quantum(&mut self, quantum: u64) {
        self.trigger_quantum = quantum;
    }

    pub fn pcm_frames_buffered(&self) -> usize {
        self.pcm.used()
    }

    /// Jump the gain index immediately, cancelling any fade.
    pub fn set_gain_index(&mut self, index: u8) {
        self.fader.cancel();
        self.gain_index = index;
    }

    /// Start a gain ramp from the current index.
    pub fn begin_fade(&mut self, target_index: u8, duration_ms: u32, stop_on_complete: bool) {
        self.fader
            .start(self.gain_index, target_index, duration_ms, stop_on_complete);
    }

    /// Request a hard stop, honored at the next quantum boundary.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn pause(&mut self) {
        if self.state == VoiceState::Playing {
            self.state = VoiceState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == VoiceState::Paused {
            self.state = VoiceState::Playing;
        }
    }

    /// Record a decoder bitstream failure; the voice finalizes on the
    /// next quantum instead of crashing the mix.
    pub fn mark_stream_error(&mut self) {
        self.stream_error = true;
    }

    /// Restart the stream counters for a gapless loop. The decoded
    /// buffer keeps its contents so playback bridges the seam.
    pub fn rewind_stream(&mut self) {
        self.eof = false;
        self.bytes_from_storage = 0;
        self.bytes_to_decoder = 0;
    }

    // ---- producer side (storage-feed step) ----

    /// True if the compressed buffer can take one more storage block.
    pub fn has_storage_space(&self) -> bool {
        self.compressed.has_space_for(BLOCK_BYTES)
    }

    /// Copy one storage block in; returns how many bytes were valid.
    ///
    /// The last block of a track is usually partial; only the bytes
    /// inside the track's size are ingested, and end-of-file is marked
    /// once the full size has been read.
    pub fn ingest_block(&mut self, block: &[u8; BLOCK_BYTES]) -> usize {
        let remaining = (self.track_size - self.bytes_from_storage) as usize;
        let n = remaining.min(BLOCK_BYTES);
        if n > 0 {
            self.compressed.write(&block[..n]);
            self.bytes_from_storage += n as u32;
        }
        if self.bytes_from_storage == self.track_size {
            self.eof = true;
        }
        n
    }

    /// Serve the decoder's pull request from the compressed buffer.
    ///
    /// Capped by both buffer contents and the track's remaining byte
    /// budget. A return of 0 means the buffer is dry; only `eof`
    /// distinguishes a mid-track stall from the end of the stream.
    pub fn fetch_compressed(&mut self, dst: &mut [u8]) -> usize {
        let budget = (self.track_size - self.bytes_to_decoder) as usize;
        let want = dst.len().min(budget);
        let got = self.compressed.read(&mut dst[..want]);
        self.bytes_to_decoder += got as u32;
        got
    }

    /// True if the decoded buffer can take one more decode frame.
    pub fn has_decode_space(&self) -> bool {
        self.pcm.has_space_for(wb_dsp::DECODE_FRAME_FRAMES)
    }

    /// Push decoded frames; caller must have checked `has_decode_space`.
    pub fn push_decoded_frames(&mut self, frames: &[Frame]) {
        self.pcm.write(frames);
    }

    // ---- consumer side (mix step) ----

    /// Render one quantum of gain-applied audio into `scratch`.
    ///
    /// Handles the stop/fade bookkeeping for this quantum: hard stops
    /// mute before the fader runs, stream errors and completed
    /// fade-to-stop requests finalize without output, and an exhausted
    /// stream finalizes after its last audible quantum.
    pub fn render_quantum(
        &mut self,
        table: &GainTable,
        scratch: &mut [Frame; QUANTUM_FRAMES],
    ) -> QuantumResult {
        if self.stream_error {
            self.state = VoiceState::Stopped;
            return QuantumResult::Finished;
        }

        // Hard stop: mute wins over any fade in flight. The first
        // quantum ramps down to silence, the next one finalizes.
        if self.stop_requested {
            if self.gain_index == SILENCE_GAIN_INDEX {
                self.state = VoiceState::Stopped;
                return QuantumResult::Finished;
            }
            self.gain_index = SILENCE_GAIN_INDEX;
            self.fader.cancel();
        }

        let short_fade = self.fader.short_fade();
        let prev_gain = self.linear_gain;
        if self.fader.service(&mut self.gain_index) {
            self.state = VoiceState::Stopped;
            return QuantumResult::Finished;
        }
        let gain = table.index_to_linear(self.gain_index);

        let got = self.pcm.read(&mut scratch[..]);
        if got < QUANTUM_FRAMES {
            q15::fill_silence(&mut scratch[got..]);
        }

        if gain != prev_gain {
            match short_fade {
                ShortFade::None => q15::ramp(&mut scratch[..], prev_gain, gain),
                ShortFade::OneThird => {
                    let split = QUANTUM_FRAMES / 3;
                    q15::ramp(&mut scratch[..split], prev_gain, gain);
                    q15::scale(&mut scratch[split..], gain);
                }
                ShortFade::TwoThirds => {
                    let split = 2 * QUANTUM_FRAMES / 3;
                    q15::ramp(&mut scratch[..split], prev_gain, gain);
                    q15::scale(&mut scratch[split..], gain);
                }
            }
        } else if self.gain_index != UNITY_GAIN_INDEX {
            q15::scale(&mut scratch[..], gain);
        }
        self.linear_gain = gain;

        self.frames_played += QUANTUM_FRAMES as u64;

        if self.eof && !self.looping && self.pcm.used() == 0 {
            self.state = VoiceState::Stopped;
            QuantumResult::MixedLast
        } else {
            QuantumResult::Mixed
        }
    }
}

impl Default for Voice {
    fn default() -> Self {
        Self::new()
    }
}
