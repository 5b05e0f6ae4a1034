//! dB-domain gain table.
//!
//! Volume scaling on the mix path is integer-only, so gains are kept
//! as linear Q1.15 amplitudes in a lookup table indexed in 0.5 dB
//! steps. The table is built once at startup and never mutated.

use libm::powf;

/// Silence floor in whole dB.
pub const MIN_GAIN_DB: i16 = -80;

/// Unity gain in whole dB.
pub const MAX_GAIN_DB: i16 = 0;

/// Number of table entries: 0.5 dB per index across the full range,
/// inclusive of both endpoints.
pub const GAIN_STEPS: usize = ((MAX_GAIN_DB - MIN_GAIN_DB) as usize * 2) + 1;

/// Index of the silence floor.
pub const SILENCE_GAIN_INDEX: u8 = 0;

/// Index of exact unity (0 dB).
pub const UNITY_GAIN_INDEX: u8 = (GAIN_STEPS - 1) as u8;

/// Entries below this index sit under the Q1.15 quantization floor and
/// are forced to exact zero.
const ZERO_FLOOR_STEPS: usize = 16;

/// Map a whole-dB gain to a table index, clamping to the valid range.
///
/// Two index units per dB, so a half-dB step occupies one unit.
pub fn db_to_index(db: i16) -> u8 {
    if db <= MIN_GAIN_DB {
        return SILENCE_GAIN_INDEX;
    }
    if db >= MAX_GAIN_DB {
        return UNITY_GAIN_INDEX;
    }
    ((db - MIN_GAIN_DB) as u8) << 1
}

/// Precomputed monotonic dB-to-linear gain table.
#[derive(Clone, Debug)]
pub struct GainTable {
    entries: [i16; GAIN_STEPS],
}

impl GainTable {
    pub fn new() -> Self {
        let mut entries = [0i16; GAIN_STEPS];
        for (i, e) in entries.iter_mut().enumerate().skip(ZERO_FLOOR_STEPS) {
            let db = MIN_GAIN_DB as f32 + i as f32 * 0.5;
            let amp = powf(10.0, db / 20.0);
            *e = (amp * 32767.0 + 0.5) as i16;
        }
        Self { entries }
    }

    /// Linear Q1.15 amplitude at a gain index. O(1), no interpolation;
    /// resolution is exactly the table's 0.5 dB granularity.
    pub fn index_to_linear(&self, index: u8) -> i16 {
        self.entries[(index as usize).min(GAIN_STEPS - 1)]
    }
}

impl Default for GainTable {
    fn default() -> Self {
        Self::new()
    }
}
