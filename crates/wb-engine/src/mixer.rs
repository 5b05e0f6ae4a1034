//! Per-quantum accumulation of every playing voice.

use wb_dsp::{q15, Frame, GainTable, QUANTUM_FRAMES};

use crate::voice::QuantumResult;
use crate::voice_pool::VoicePool;

/// Owns the shared output accumulator and the per-voice scratch
/// buffer, so the mix step never allocates.
pub struct Mixer {
    accumulator: [Frame; QUANTUM_FRAMES],
    scratch: [Frame; QUANTUM_FRAMES],
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            accumulator: [Frame::silence(); QUANTUM_FRAMES],
            scratch: [Frame::silence(); QUANTUM_FRAMES],
        }
    }

    /// Render one quantum: clear the accumulator, then render and
    /// saturating-add every playing voice into it.
    ///
    /// Voices that finalize during this quantum are left in Stopped
    /// state for the caller to reap.
    pub fn mix_quantum(
        &mut self,
        pool: &mut VoicePool,
        table: &GainTable,
    ) -> &[Frame; QUANTUM_FRAMES] {
        q15::fill_silence(&mut self.accumulator);
        for voice in pool.iter_mut() {
            if !voice.is_playing() {
                continue;
            }
            match voice.render_quantum(table, &mut self.scratch) {
                QuantumResult::Mixed | QuantumResult::MixedLast => {
                    q15::accumulate(&mut self.accumulator, &self.scratch);
                }
                QuantumResult::Finished => {}
            }
        }
        &self.accumulator
    }

    /// The most recently mixed quantum.
    pub fn accumulator(&self) -> &[Frame; QUANTUM_FRAMES] {
        &self.accumulator
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::VoiceState;
    use crate::voice_pool::VoiceId;
    use wb_dsp::{SILENCE_GAIN_INDEX, UNITY_GAIN_INDEX};

    fn voice_with_pcm(
        pool: &mut VoicePool,
        table: &GainTable,
        gain_index: u8,
        value: i16,
        frames: usize,
    ) -> VoiceId {
        let id = pool.allocate().expect("no free slot");
        let v = pool.voice_mut(id).unwrap();
        v.activate(0, 1 << 20, false, false, gain_index, table);
        let chunk = [Frame::mono(value); QUANTUM_FRAMES];
        let mut left = frames;
        while left > 0 {
            let n = left.min(QUANTUM_FRAMES);
            v.push_decoded_frames(&chunk[..n]);
            left -= n;
        }
        id
    }

    #[test]
    fn empty_pool_mixes_silence() {
        let table = GainTable::new();
        let mut pool = VoicePool::new();
        let mut mixer = Mixer::new();
        let out = mixer.mix_quantum(&mut pool, &table);
        assert!(out.iter().all(|f| *f == Frame::silence()));
    }

    #[test]
    fn silent_voices_leave_accumulator_unchanged() {
        let table = GainTable::new();
        let mut pool = VoicePool::new();
        for _ in 0..4 {
            voice_with_pcm(&mut pool, &table, SILENCE_GAIN_INDEX, 30000, QUANTUM_FRAMES);
        }
        let mut mixer = Mixer::new();
        let out = mixer.mix_quantum(&mut pool, &table);
        assert!(out.iter().all(|f| *f == Frame::silence()));
    }

    #[test]
    fn unity_voice_reproduces_samples() {
        let table = GainTable::new();
        let mut pool = VoicePool::new();
        voice_with_pcm(&mut pool, &table, UNITY_GAIN_INDEX, -4321, QUANTUM_FRAMES);
        let mut mixer = Mixer::new();
        let out = mixer.mix_quantum(&mut pool, &table);
        assert!(out.iter().all(|f| f.left == -4321 && f.right == -4321));
    }

    #[test]
    fn two_voices_add_with_saturation() {
        let table = GainTable::new();
        let mut pool = VoicePool::new();
        voice_with_pcm(&mut pool, &table, UNITY_GAIN_INDEX, 20000, QUANTUM_FRAMES);
        voice_with_pcm(&mut pool, &table, UNITY_GAIN_INDEX, 20000, QUANTUM_FRAMES);
        let mut mixer = Mixer::new();
        let out = mixer.mix_quantum(&mut pool, &table);
        assert!(out.iter().all(|f| f.left == i16::MAX));
    }

    #[test]
    fn paused_voices_are_skipped() {
        let table = GainTable::new();
        let mut pool = VoicePool::new();
        let id = voice_with_pcm(&mut pool, &table, UNITY_GAIN_INDEX, 5000, QUANTUM_FRAMES);
        pool.voice_mut(id).unwrap().pause();
        let mut mixer = Mixer::new();
        let out = mixer.mix_quantum(&mut pool, &table);
        assert!(out.iter().all(|f| *f == Frame::silence()));
        // Nothing was drained while paused
        assert_eq!(pool.voice(id).unwrap().pcm_frames_buffered(), QUANTUM_FRAMES);
    }

    #[test]
    fn finalizing_voice_still_contributes_its_last_quantum() {
        let table = GainTable::new();
        let mut pool = VoicePool::new();
        let id = voice_with_pcm(&mut pool, &table, UNITY_GAIN_INDEX, 7000, QUANTUM_FRAMES / 2);
        {
            let v = pool.voice_mut(id).unwrap();
            // Exhaust the stream so this quantum is the last one.
            let block = [0u8; wb_dsp::BLOCK_BYTES];
            let mut remaining = v.track_size();
            while remaining > 0 {
                remaining -= v.ingest_block(&block) as u32;
                if !v.has_storage_space() {
                    let mut sink = [0u8; wb_dsp::BLOCK_BYTES];
                    v.fetch_compressed(&mut sink);
                }
            }
        }
        let mut mixer = Mixer::new();
        let out = mixer.mix_quantum(&mut pool, &table);
        assert!(out[..QUANTUM_FRAMES / 2].iter().all(|f| f.left == 7000));
        assert!(out[QUANTUM_FRAMES / 2..].iter().all(|f| *f == Frame::silence()));
        assert_eq!(pool.voice(id).unwrap().state(), VoiceState::Stopped);
    }
}
