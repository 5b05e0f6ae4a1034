//! Headless playback controller for wavebox.
//!
//! Ties the storage catalog, codecs, and the streaming engine together
//! behind the control-plane API: open a voice on a track, stop or fade
//! it, and drive the two-step schedule (storage feed at low rate, mix
//! at the quantum rate) that both the CLI and offline rendering share.

mod wav;

use std::fmt;

use log::{debug, info, warn};

use wb_codec::{AdpcmDecoder, PcmDecoder};
use wb_engine::{decode_ahead, FrameDecoder, Mixer, VoiceId, VoicePool, MAX_VOICES};
use wb_store::{BlockDevice, Catalog, StoreError, TrackFormat, TrackStream};

// Re-export common types so callers don't need the leaf crates directly.
pub use wb_dsp::{
    db_to_index, Frame, GainTable, BLOCK_BYTES, DECODE_FRAME_FRAMES, QUANTUM_FRAMES, SAMPLE_RATE,
    SILENCE_GAIN_INDEX,
};
pub use wb_engine::VoiceState;

pub use wav::{frames_to_wav, write_wav};

/// Control-plane errors.
#[derive(Debug)]
pub enum PlayerError {
    /// Track or voice index does not refer to anything.
    BadIndex(usize),
    /// Every voice slot is occupied.
    NoFreeVoice,
    /// Storage failed; not recoverable from inside the player.
    Store(StoreError),
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerError::BadIndex(i) => write!(f, "no such track or voice: {}", i),
            PlayerError::NoFreeVoice => write!(f, "all voice slots are busy"),
            PlayerError::Store(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl std::error::Error for PlayerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlayerError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for PlayerError {
    fn from(e: StoreError) -> Self {
        PlayerError::Store(e)
    }
}

/// Owns the device, catalog, and engine state for one player instance.
pub struct Player<D: BlockDevice> {
    device: D,
    catalog: Catalog,
    table: GainTable,
    pool: VoicePool,
    mixer: Mixer,
    streams: [Option<TrackStream>; MAX_VOICES],
    decoders: [Option<Box<dyn FrameDecoder>>; MAX_VOICES],
    // Decode scratch lives here so the feed step never allocates.
    decode_scratch: Box<[Frame; DECODE_FRAME_FRAMES]>,
    quanta_mixed: u64,
}

impl<D: BlockDevice> Player<D> {
    pub fn new(device: D, catalog: Catalog) -> Self {
        Self {
            device,
            catalog,
            table: GainTable::new(),
            pool: VoicePool::new(),
            mixer: Mixer::new(),
            streams: std::array::from_fn(|_| None),
            decoders: std::array::from_fn(|_| None),
            decode_scratch: Box::new([Frame::silence(); DECODE_FRAME_FRAMES]),
            quanta_mixed: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Voices currently holding a slot.
    pub fn active_voices(&self) -> usize {
        self.pool.active_count()
    }

    /// Inspect one voice slot.
    pub fn voice(&self, id: VoiceId) -> Option<&wb_engine::Voice> {
        self.pool.voice(id)
    }

    /// Start a track on a free voice at `gain_db` (clamped to the gain
    /// table's range) and prime its buffers.
    pub fn open_voice(&mut self, track: usize, gain_db: i16) -> Result<VoiceId, PlayerError> {
        let track_info = self.catalog.info(track).ok_or(PlayerError::BadIndex(track))?;
        let id = self.pool.allocate().ok_or(PlayerError::NoFreeVoice)?;

        let stream = self
            .catalog
            .open(track)
            .ok_or(PlayerError::BadIndex(track))?;
        let decoder: Box<dyn FrameDecoder> = match track_info.format {
            TrackFormat::Pcm => Box::new(PcmDecoder::new()),
            TrackFormat::Adpcm => Box::new(AdpcmDecoder::new()),
        };

        if let Some(v) = self.pool.voice_mut(id) {
            v.activate(
                track,
                track_info.size_bytes,
                track_info.looping,
                track_info.locked,
                db_to_index(gain_db),
                &self.table,
            );
            v.set_trigger_quantum(self.quanta_mixed);
        }
        self.streams[id] = Some(stream);
        self.decoders[id] = Some(decoder);

        // Prime the buffers so the first quantum has audio ready.
        self.feed_voice(id)?;
        info!(
            "voice {}: track {} at {} dB ({} bytes)",
            id, track, gain_db, track_info.size_bytes
        );
        Ok(id)
    }

    /// Stop a voice: immediately (hard mute at the next quantum) when
    /// `release_ms` is 0, otherwise via a fade-out of that length.
    pub fn stop_voice(&mut self, id: VoiceId, release_ms: u32) -> Result<(), PlayerError> {
        let voice = self.pool.voice_mut(id).ok_or(PlayerError::BadIndex(id))?;
        if voice.state() == VoiceState::Available {
            return Err(PlayerError::BadIndex(id));
        }
        // A fade toward the index the voice already sits at is a
        // no-op, so a release from the silence floor stops directly.
        if release_ms == 0 || voice.gain_index() == SILENCE_GAIN_INDEX {
            voice.request_stop();
        } else {
            voice.begin_fade(SILENCE_GAIN_INDEX, release_ms, true);
        }
        Ok(())
    }

    /// Ramp a voice to `target_db` over `duration_ms`, optionally
    /// stopping it when the ramp lands.
    pub fn start_fade(
        &mut self,
        id: VoiceId,
        target_db: i16,
        duration_ms: u32,
        stop_on_complete: bool,
    ) -> Result<(), PlayerError> {
        let voice = self.pool.voice_mut(id).ok_or(PlayerError::BadIndex(id))?;
        if voice.state() == VoiceState::Available {
            return Err(PlayerError::BadIndex(id));
        }
        voice.begin_fade(db_to_index(target_db), duration_ms, stop_on_complete);
        Ok(())
    }

    /// Jump a voice's gain immediately, cancelling any fade.
    pub fn set_gain(&mut self, id: VoiceId, gain_db: i16) -> Result<(), PlayerError> {
        let voice = self.pool.voice_mut(id).ok_or(PlayerError::BadIndex(id))?;
        if voice.state() == VoiceState::Available {
            return Err(PlayerError::BadIndex(id));
        }
        voice.set_gain_index(db_to_index(gain_db));
        Ok(())
    }

    pub fn pause(&mut self, id: VoiceId) -> Result<(), PlayerError> {
        let voice = self.pool.voice_mut(id).ok_or(PlayerError::BadIndex(id))?;
        voice.pause();
        Ok(())
    }

    pub fn resume(&mut self, id: VoiceId) -> Result<(), PlayerError> {
        let voice = self.pool.voice_mut(id).ok_or(PlayerError::BadIndex(id))?;
        voice.resume();
        Ok(())
    }

    /// Request a stop on every voice; locked voices survive unless
    /// `force` is set.
    pub fn stop_all(&mut self, force: bool) {
        self.pool.stop_all(force);
    }

    /// The low-rate half of the schedule: keep every active voice's
    /// compressed buffer full and its PCM buffer decoded ahead.
    pub fn feed_step(&mut self) -> Result<(), PlayerError> {
        for id in 0..MAX_VOICES {
            self.feed_voice(id)?;
        }
        Ok(())
    }

    fn feed_voice(&mut self, id: VoiceId) -> Result<(), PlayerError> {
        let Self {
            device,
            pool,
            streams,
            decoders,
            decode_scratch,
            ..
        } = self;
        let Some(voice) = pool.voice_mut(id) else {
            return Ok(());
        };
        if matches!(voice.state(), VoiceState::Available | VoiceState::Stopped) {
            return Ok(());
        }
        let (Some(stream), Some(decoder)) = (streams[id].as_mut(), decoders[id].as_mut()) else {
            return Ok(());
        };

        let mut block = [0u8; BLOCK_BYTES];
        loop {
            while !voice.end_of_file() && voice.has_storage_space() && !stream.exhausted() {
                stream.read_block(device, &mut block)?;
                voice.ingest_block(&block);
            }

            if !voice.has_decode_space() {
                break;
            }
            match decode_ahead(voice, decoder.as_mut(), decode_scratch) {
                Ok(0) => {
                    // Input ran dry. For a looping track whose whole
                    // byte budget has been decoded, wrap around and
                    // keep the PCM buffer fed across the seam.
                    if voice.end_of_file()
                        && voice.looping()
                        && voice.bytes_to_decoder() == voice.track_size()
                    {
                        debug!("voice {}: loop rewind", id);
                        stream.rewind();
                        decoder.reset();
                        voice.rewind_stream();
                        continue;
                    }
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("voice {}: {}", id, e);
                    voice.mark_stream_error();
                    break;
                }
            }
        }
        Ok(())
    }

    /// The real-time half of the schedule: mix one quantum and recycle
    /// any voice that finished during it.
    pub fn mix_quantum(&mut self) -> &[Frame; QUANTUM_FRAMES] {
        self.mixer.mix_quantum(&mut self.pool, &self.table);
        self.quanta_mixed += 1;
        self.reap();
        self.mixer.accumulator()
    }

    // The stale stream and boxed decoder stay in their slots until
    // open_voice reuses them: freeing them here would put a heap
    // operation on the mix path.
    fn reap(&mut self) {
        for (id, voice) in self.pool.iter().enumerate() {
            if voice.state() == VoiceState::Stopped {
                debug!("voice {}: finished after {} frames", id, voice.frames_played());
            }
        }
        self.pool.reap();
    }

    /// Render offline until every voice finishes or `max_frames` is
    /// reached.
    pub fn render_frames(&mut self, max_frames: usize) -> Result<Vec<Frame>, PlayerError> {
        let mut frames = Vec::with_capacity(max_frames.min(SAMPLE_RATE as usize * 60));
        while self.active_voices() > 0 && frames.len() < max_frames {
            self.feed_step()?;
            let quantum = self.mix_quantum();
            let take = quantum.len().min(max_frames - frames.len());
            frames.extend_from_slice(&quantum[..take]);
        }
        Ok(frames)
    }
}
