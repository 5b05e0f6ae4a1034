//! Per-voice gain envelope state machine.
//!
//! Drives a voice's discrete gain index toward a target over a
//! requested duration, one step per mix quantum. Durations shorter
//! than one quantum period cannot ramp across whole quanta; those
//! become "short fades" that snap the index and let the mixer ramp a
//! fraction of a single quantum instead.

use wb_dsp::{Fx16, FADE_QUANTUM_MS};

/// Sub-quantum fade shape: how much of one mix quantum the ramp spans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShortFade {
    #[default]
    None,
    /// 1 ms fade: ramp across the first third of the quantum.
    OneThird,
    /// 2 ms fade: ramp across the first two thirds.
    TwoThirds,
}

/// Gain envelope state for one voice.
#[derive(Clone, Debug, Default)]
pub struct Fader {
    active: bool,
    stop_on_complete: bool,
    up: bool,
    short_fade: ShortFade,
    short_fade_done: bool,
    target_index: u8,
    delta: Fx16,
    accum: Fx16,
}

impl Fader {
    /// Begin a fade from `current_index` to `target_index` over
    /// `duration_ms`.
    ///
    /// Durations below one quantum period become short fades (a
    /// duration of 0 clamps to 1 ms). A normal-duration fade to the
    /// current index cancels any fade in flight and stays idle.
    pub fn start(
        &mut self,
        current_index: u8,
        target_index: u8,
        duration_ms: u32,
        stop_on_complete: bool,
    ) {
        if duration_ms < FADE_QUANTUM_MS {
            self.short_fade = if duration_ms >= 2 {
                ShortFade::TwoThirds
            } else {
                ShortFade::OneThird
            };
            self.target_index = target_index;
            self.stop_on_complete = stop_on_complete;
            self.short_fade_done = false;
            self.active = true;
            return;
        }

        self.short_fade = ShortFade::None;
        self.target_index = target_index;
        if target_index == current_index {
            self.active = false;
            return;
        }

        self.up = target_index > current_index;
        let distance = current_index.abs_diff(target_index) as u32;
        // A very long fade over a short distance truncates to a zero
        // per-quantum delta; floor it at one raw step so the ramp
        // always reaches the target.
        let raw = ((distance << 16) * FADE_QUANTUM_MS / duration_ms).max(1);
        self.delta = Fx16::from_raw(raw);
        self.accum = Fx16::from_int(current_index as u16);
        self.stop_on_complete = stop_on_complete;
        self.active = true;
    }

    /// Abandon any fade in flight.
    pub fn cancel(&mut self) {
        self.active = false;
        self.short_fade = ShortFade::None;
        self.short_fade_done = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Short-fade mode, consumed by the mixer to shape the
    /// intra-quantum ramp.
    pub fn short_fade(&self) -> ShortFade {
        self.short_fade
    }

    /// Advance the envelope by one quantum, updating `current_index`.
    ///
    /// Returns true exactly once, when a fade with the stop request
    /// finishes; the caller must then finalize the voice without
    /// mixing it this quantum.
    pub fn service(&mut self, current_index: &mut u8) -> bool {
        if !self.active {
            return false;
        }

        if self.short_fade != ShortFade::None {
            if self.short_fade_done {
                self.active = false;
                self.short_fade = ShortFade::None;
                self.short_fade_done = false;
                return self.stop_on_complete;
            }
            // Snap now; the mixer ramps the sub-quantum fraction.
            *current_index = self.target_index;
            self.short_fade_done = true;
            return false;
        }

        if self.up {
            if *current_index >= self.target_index {
                self.active = false;
                return self.stop_on_complete;
            }
            self.accum = self.accum.saturating_add(self.delta);
            *current_index = self.accum.int_part().min(self.target_index as u16) as u8;
        } else {
            if *current_index <= self.target_index {
                self.active = false;
                return self.stop_on_complete;
            }
            self.accum = self.accum.saturating_sub(self.delta);
            *current_index = self.accum.int_part().max(self.target_index as u16) as u8;
        }
        false
    }
}
