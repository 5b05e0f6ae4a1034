//! Q1.15 block operations for the mix path.
//!
//! Scale, ramp, and saturating-add over frame slices. Only the numeric
//! contract matters here; no particular vectorization is assumed.

use crate::Frame;

#[inline]
fn scale_sample(s: i16, gain: i16) -> i16 {
    ((s as i32 * gain as i32) >> 15) as i16
}

/// Scale every sample by a single Q1.15 gain.
pub fn scale(buf: &mut [Frame], gain: i16) {
    for f in buf {
        f.left = scale_sample(f.left, gain);
        f.right = scale_sample(f.right, gain);
    }
}

/// Apply a constant-slope gain ramp from `start` to `end` across the
/// buffer.
///
/// The per-frame gain is tracked in 16.16 fixed point so a short
/// quantum ramps without audible stair-stepping. The first frame is
/// scaled by exactly `start`; the caller holds `end` flat from the
/// next block on.
pub fn ramp(buf: &mut [Frame], start: i16, end: i16) {
    let n = buf.len();
    if n == 0 {
        return;
    }
    let delta = (((end as i32) - (start as i32)) << 16) / n as i32;
    let mut accum: i32 = 0;
    for f in buf.iter_mut() {
        let gain = (start as i32 + (accum >> 16)) as i16;
        f.left = scale_sample(f.left, gain);
        f.right = scale_sample(f.right, gain);
        accum += delta;
    }
}

/// Element-wise saturating 16-bit accumulate of `src` into `dst`.
pub fn accumulate(dst: &mut [Frame], src: &[Frame]) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        d.mix(*s);
    }
}

/// Zero-fill a frame buffer.
pub fn fill_silence(buf: &mut [Frame]) {
    for f in buf {
        *f = Frame::silence();
    }
}
