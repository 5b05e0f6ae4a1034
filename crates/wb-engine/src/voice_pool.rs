//! Fixed pool of voice slots.

use heapless::Vec;

use crate::voice::{Voice, VoiceState};

/// Number of simultaneous playback voices.
pub const MAX_VOICES: usize = 8;

/// Handle to a slot in the pool.
pub type VoiceId = usize;

/// Owns every voice slot; all cross-voice operations go through here.
pub struct VoicePool {
    slots: Vec<Voice, MAX_VOICES>,
}

impl VoicePool {
    pub fn new() -> Self {
        let mut slots = Vec::new();
        for _ in 0..MAX_VOICES {
            // Capacity equals MAX_VOICES, pushes cannot fail.
            let _ = slots.push(Voice::new());
        }
        Self { slots }
    }

    /// Find an Available slot; the caller activates it.
    pub fn allocate(&mut self) -> Option<VoiceId> {
        self.slots
            .iter()
            .position(|v| v.state() == VoiceState::Available)
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.slots.get(id)
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.slots.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.slots.iter_mut()
    }

    /// Voices currently in Playing state.
    pub fn playing_count(&self) -> usize {
        self.slots.iter().filter(|v| v.is_playing()).count()
    }

    /// Voices holding a slot in any state other than Available.
    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|v| v.state() != VoiceState::Available)
            .count()
    }

    /// Request a hard stop on one voice.
    pub fn stop(&mut self, id: VoiceId) {
        if let Some(v) = self.slots.get_mut(id) {
            v.request_stop();
        }
    }

    /// Request a hard stop on every active voice. Locked voices are
    /// skipped unless `force` is set.
    pub fn stop_all(&mut self, force: bool) {
        for v in self.slots.iter_mut() {
            if v.state() == VoiceState::Available {
                continue;
            }
            if v.locked() && !force {
                continue;
            }
            v.request_stop();
        }
    }

    /// Return every Stopped slot to Available.
    pub fn reap(&mut self) {
        for v in self.slots.iter_mut() {
            if v.state() == VoiceState::Stopped {
                v.reset();
            }
        }
    }
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wb_dsp::{GainTable, UNITY_GAIN_INDEX};

    fn activate(pool: &mut VoicePool, table: &GainTable, locked: bool) -> VoiceId {
        let id = pool.allocate().expect("no free slot");
        pool.voice_mut(id)
            .unwrap()
            .activate(0, 1024, false, locked, UNITY_GAIN_INDEX, table);
        id
    }

    #[test]
    fn allocate_exhausts_at_capacity() {
        let table = GainTable::new();
        let mut pool = VoicePool::new();
        for _ in 0..MAX_VOICES {
            activate(&mut pool, &table, false);
        }
        assert_eq!(pool.allocate(), None);
        assert_eq!(pool.playing_count(), MAX_VOICES);
    }

    #[test]
    fn reap_recycles_stopped_slots() {
        let table = GainTable::new();
        let mut pool = VoicePool::new();
        for _ in 0..MAX_VOICES {
            activate(&mut pool, &table, false);
        }
        let mut scratch = [wb_dsp::Frame::silence(); wb_dsp::QUANTUM_FRAMES];
        pool.stop(2);
        // Two quanta: mute ramp, then finalize.
        pool.voice_mut(2).unwrap().render_quantum(&table, &mut scratch);
        pool.voice_mut(2).unwrap().render_quantum(&table, &mut scratch);
        assert_eq!(pool.allocate(), None);
        pool.reap();
        assert_eq!(pool.allocate(), Some(2));
    }

    #[test]
    fn stop_all_respects_lock() {
        let table = GainTable::new();
        let mut pool = VoicePool::new();
        let unlocked = activate(&mut pool, &table, false);
        let locked = activate(&mut pool, &table, true);

        pool.stop_all(false);
        let mut scratch = [wb_dsp::Frame::silence(); wb_dsp::QUANTUM_FRAMES];
        for id in [unlocked, locked] {
            pool.voice_mut(id).unwrap().render_quantum(&table, &mut scratch);
            pool.voice_mut(id).unwrap().render_quantum(&table, &mut scratch);
        }
        assert_eq!(pool.voice(unlocked).unwrap().state(), VoiceState::Stopped);
        assert_eq!(pool.voice(locked).unwrap().state(), VoiceState::Playing);

        pool.stop_all(true);
        pool.voice_mut(locked).unwrap().render_quantum(&table, &mut scratch);
        pool.voice_mut(locked).unwrap().render_quantum(&table, &mut scratch);
        assert_eq!(pool.voice(locked).unwrap().state(), VoiceState::Stopped);
    }
}
