//! Stereo audio frame type.

/// A stereo audio frame (16-bit integer samples).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub left: i16,
    pub right: i16,
}

impl Frame {
    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { left: 0, right: 0 }
    }

    /// Create a mono frame (same value for both channels).
    pub const fn mono(value: i16) -> Self {
        Self {
            left: value,
            right: value,
        }
    }

    /// Mix another frame into this one with 16-bit saturation.
    pub fn mix(&mut self, other: Frame) {
        let left = (self.left as i32 + other.left as i32).clamp(-32768, 32767);
        let right = (self.right as i32 + other.right as i32).clamp(-32768, 32767);
        self.left = left as i16;
        self.right = right as i16;
    }

    /// Scale both channels by a Q1.15 gain.
    pub fn scale(&mut self, gain: i16) {
        self.left = ((self.left as i32 * gain as i32) >> 15) as i16;
        self.right = ((self.right as i32 * gain as i32) >> 15) as i16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_sums_channels() {
        let mut a = Frame { left: 100, right: -50 };
        a.mix(Frame { left: 20, right: 30 });
        assert_eq!(a, Frame { left: 120, right: -20 });
    }

    #[test]
    fn mix_saturates() {
        let mut a = Frame::mono(32000);
        a.mix(Frame::mono(32000));
        assert_eq!(a, Frame::mono(32767));

        let mut b = Frame::mono(-32000);
        b.mix(Frame::mono(-32000));
        assert_eq!(b, Frame::mono(-32768));
    }

    #[test]
    fn scale_unity_is_near_identity() {
        let mut f = Frame { left: 10000, right: -10000 };
        f.scale(32767);
        // Q1.15 unity is 32767/32768, one LSB short of exact
        assert!((f.left - 10000).abs() <= 1);
        assert!((f.right + 10000).abs() <= 1);
    }

    #[test]
    fn scale_zero_silences() {
        let mut f = Frame { left: 12345, right: -12345 };
        f.scale(0);
        assert_eq!(f, Frame::silence());
    }
}
