//! End-to-end streaming scenarios through the full player stack:
//! RAM block device -> catalog -> voice buffers -> decoder -> mixer.

use wb_dsp::{Frame, BLOCK_BYTES, QUANTUM_FRAMES, SILENCE_GAIN_INDEX};
use wb_engine::VoiceState;
use wb_player::Player;
use wb_store::{Catalog, MemDisk, TrackFormat};

fn pcm_bytes(frames: &[Frame]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frames.len() * 4);
    for f in frames {
        bytes.extend_from_slice(&f.left.to_le_bytes());
        bytes.extend_from_slice(&f.right.to_le_bytes());
    }
    bytes
}

fn sine_frames(n: usize, amplitude: f32) -> Vec<Frame> {
    (0..n)
        .map(|i| Frame::mono((libm::sinf(i as f32 * 0.03) * amplitude) as i16))
        .collect()
}

fn player_with_pcm(frames: &[Frame], looping: bool) -> Player<MemDisk> {
    let mut disk = MemDisk::new(4096);
    let mut catalog = Catalog::new();
    catalog
        .add_track(&mut disk, &pcm_bytes(frames), TrackFormat::Pcm, looping, false)
        .unwrap();
    Player::new(disk, catalog)
}

#[test]
fn ten_block_track_delivers_its_whole_byte_budget() {
    // 10 blocks = 1280 stereo frames
    let frames = sine_frames(10 * BLOCK_BYTES / 4, 20000.0);
    let mut player = player_with_pcm(&frames, false);
    let id = player.open_voice(0, 0).unwrap();

    player.feed_step().unwrap();
    let voice = player.voice(id).unwrap();
    assert!(voice.end_of_file());
    assert_eq!(voice.bytes_from_storage(), 10 * BLOCK_BYTES as u32);
    assert_eq!(voice.bytes_to_decoder(), 10 * BLOCK_BYTES as u32);
}

#[test]
fn full_track_plays_out_and_releases_the_voice() {
    let frames = sine_frames(QUANTUM_FRAMES * 37 + 50, 18000.0);
    let mut player = player_with_pcm(&frames, false);
    player.open_voice(0, 0).unwrap();

    let mut rendered: Vec<Frame> = Vec::new();
    while player.active_voices() > 0 {
        player.feed_step().unwrap();
        rendered.extend_from_slice(player.mix_quantum());
        assert!(rendered.len() <= (37 + 2) * QUANTUM_FRAMES, "never finished");
    }
    // At unity gain the voice's samples come through verbatim, with
    // the final quantum zero-padded.
    assert_eq!(&rendered[..frames.len()], frames.as_slice());
    assert!(rendered[frames.len()..].iter().all(|f| *f == Frame::silence()));
}

#[test]
fn fade_to_stop_lands_within_its_duration_and_only_at_silence() {
    let frames = sine_frames(QUANTUM_FRAMES * 200, 20000.0);
    let mut player = player_with_pcm(&frames, false);
    let id = player.open_voice(0, 0).unwrap();
    player.start_fade(id, -80, 100, true).unwrap();

    // 100 ms of 3 ms quanta, plus the finalizing call.
    let budget = 100 / 3 + 2;
    let mut quanta = 0;
    while player.active_voices() > 0 {
        player.feed_step().unwrap();
        player.mix_quantum();
        quanta += 1;
        if let Some(v) = player.voice(id) {
            if v.state() == VoiceState::Playing {
                // Still audible: the stop must not have landed before
                // the ramp reaches the floor.
                assert!(quanta <= budget, "fade overran: {} quanta", quanta);
            }
        }
    }
    assert!(quanta <= budget, "stopped after {} quanta", quanta);
    assert!(quanta >= 100 / 3 - 2, "stopped early, after {} quanta", quanta);
}

#[test]
fn stopped_voice_reaches_silence_index_before_release() {
    let frames = sine_frames(QUANTUM_FRAMES * 200, 20000.0);
    let mut player = player_with_pcm(&frames, false);
    let id = player.open_voice(0, 0).unwrap();
    player.start_fade(id, -80, 60, true).unwrap();

    let mut last_seen_index = None;
    while player.active_voices() > 0 {
        player.feed_step().unwrap();
        player.mix_quantum();
        if let Some(v) = player.voice(id) {
            last_seen_index = Some(v.gain_index());
        }
    }
    assert_eq!(last_seen_index, Some(SILENCE_GAIN_INDEX));
}

#[test]
fn storage_stall_pads_silence_without_finalizing() {
    // Long track so the primed buffers are nowhere near end-of-file.
    let frames = sine_frames(QUANTUM_FRAMES * 400, 15000.0);
    let mut player = player_with_pcm(&frames, false);
    let id = player.open_voice(0, 0).unwrap();

    // Starve the feed: mix until the primed PCM runs out, then keep
    // mixing through the stall.
    let primed = player.voice(id).unwrap().pcm_frames_buffered();
    let primed_quanta = primed / QUANTUM_FRAMES + 1;
    for _ in 0..primed_quanta {
        player.mix_quantum();
    }
    assert_eq!(player.voice(id).unwrap().pcm_frames_buffered(), 0);

    for _ in 0..10 {
        let out = player.mix_quantum();
        assert!(out.iter().all(|f| *f == Frame::silence()));
        assert_eq!(player.voice(id).unwrap().state(), VoiceState::Playing);
    }

    // Feeding resumes and audio comes back.
    player.feed_step().unwrap();
    let out = player.mix_quantum();
    assert!(out.iter().any(|f| *f != Frame::silence()));
}

#[test]
fn voice_finalizes_exactly_when_drained_at_end_of_file() {
    let frames = sine_frames(QUANTUM_FRAMES * 3, 10000.0);
    let mut player = player_with_pcm(&frames, false);
    let id = player.open_voice(0, 0).unwrap();
    player.feed_step().unwrap();
    assert!(player.voice(id).unwrap().end_of_file());

    player.mix_quantum();
    player.mix_quantum();
    assert_eq!(player.voice(id).unwrap().state(), VoiceState::Playing);
    player.mix_quantum();
    assert_eq!(player.active_voices(), 0);
}

#[test]
fn looping_track_restarts_gaplessly() {
    // One quantum of a recognizable pattern, looped.
    let frames: Vec<Frame> = (0..QUANTUM_FRAMES)
        .map(|i| Frame::mono(100 + i as i16))
        .collect();
    let mut player = player_with_pcm(&frames, true);
    player.open_voice(0, 0).unwrap();

    for _ in 0..20 {
        player.feed_step().unwrap();
        let out = player.mix_quantum();
        // Every quantum replays the same pattern with no silent seam.
        for (i, f) in out.iter().enumerate() {
            assert_eq!(f.left, 100 + i as i16);
        }
    }
    assert_eq!(player.active_voices(), 1);
}

#[test]
fn concurrent_voices_mix_additively() {
    let a = vec![Frame::mono(10000); QUANTUM_FRAMES * 4];
    let b = vec![Frame::mono(-3000); QUANTUM_FRAMES * 4];
    let mut disk = MemDisk::new(256);
    let mut catalog = Catalog::new();
    catalog
        .add_track(&mut disk, &pcm_bytes(&a), TrackFormat::Pcm, false, false)
        .unwrap();
    catalog
        .add_track(&mut disk, &pcm_bytes(&b), TrackFormat::Pcm, false, false)
        .unwrap();
    let mut player = Player::new(disk, catalog);
    player.open_voice(0, 0).unwrap();
    player.open_voice(1, 0).unwrap();

    player.feed_step().unwrap();
    let out = player.mix_quantum();
    assert!(out.iter().all(|f| f.left == 7000 && f.right == 7000));
}
