//! WAV encoding for 16-bit stereo PCM.

use std::io::Write;
use wb_dsp::Frame;

const CHANNELS: u16 = 2;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_FRAME: u32 = (CHANNELS * BITS_PER_SAMPLE / 8) as u32;

/// Write a complete RIFF/WAVE file: 44-byte header followed by
/// interleaved little-endian samples.
pub fn write_wav(w: &mut impl Write, frames: &[Frame], sample_rate: u32) -> std::io::Result<()> {
    let data_size = frames.len() as u32 * BYTES_PER_FRAME;

    let mut header = [0u8; 44];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    header[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&(sample_rate * BYTES_PER_FRAME).to_le_bytes());
    header[32..34].copy_from_slice(&(BYTES_PER_FRAME as u16).to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());
    w.write_all(&header)?;

    for frame in frames {
        w.write_all(&frame.left.to_le_bytes())?;
        w.write_all(&frame.right.to_le_bytes())?;
    }
    Ok(())
}

pub fn frames_to_wav(frames: &[Frame], sample_rate: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(44 + frames.len() * BYTES_PER_FRAME as usize);
    write_wav(&mut buf, frames, sample_rate).expect("Vec<u8> write cannot fail");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let frames = [Frame::mono(1000), Frame::mono(-1000)];
        let wav = frames_to_wav(&frames, 44_100);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");
        // 2 frames * 4 bytes
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 8);
        assert_eq!(wav.len(), 44 + 8);
    }

    #[test]
    fn samples_are_little_endian_interleaved() {
        let frames = [Frame {
            left: 0x0102,
            right: 0x0304,
        }];
        let wav = frames_to_wav(&frames, 44_100);
        assert_eq!(&wav[44..48], &[0x02, 0x01, 0x04, 0x03]);
    }
}
