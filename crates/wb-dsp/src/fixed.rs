//! Unsigned Q16.16 fixed-point value, used by the fader's ramp
//! accumulator.

/// Unsigned 16.16 fixed-point value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fx16(u32);

impl Fx16 {
    pub const ZERO: Self = Fx16(0);

    /// Value with `v` as the integer part and a zero fraction.
    pub const fn from_int(v: u16) -> Self {
        Fx16((v as u32) << 16)
    }

    /// Value from a raw 16.16 bit pattern.
    pub const fn from_raw(raw: u32) -> Self {
        Fx16(raw)
    }

    /// Raw 16.16 bit pattern.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Integer part, truncating the fraction.
    pub const fn int_part(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Add, saturating at the representable maximum.
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Fx16(self.0.saturating_add(rhs.0))
    }

    /// Subtract, clamping at zero (never wraps).
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Fx16(self.0.saturating_sub(rhs.0))
    }
}
