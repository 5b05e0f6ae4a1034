//! wavebox CLI — play a track from a sound bank, or render it to WAV.
//!
//! Usage:
//!   wavebox <sounds-dir> <track#> [--gain dB] [--wav output.wav]
//!
//! The sound bank is a directory of `.pcm` (16-bit LE stereo) and
//! `.adp` (IMA ADPCM) files, loaded onto a RAM-backed block device in
//! filename order.

use std::path::Path;
use std::time::Duration;
use std::{env, fs, process};

use log::info;
use wb_audio::{AudioOutput, CpalOutput};
use wb_player::{frames_to_wav, Player, QUANTUM_FRAMES, SAMPLE_RATE};
use wb_store::{Catalog, MemDisk};

fn main() {
    pretty_env_logger::init();

    let args: Vec<String> = env::args().collect();
    let (Some(dir), Some(track)) = (args.get(1), args.get(2)) else {
        eprintln!("Usage: wavebox <sounds-dir> <track#> [--gain dB] [--wav output.wav]");
        process::exit(1);
    };
    let track: usize = track.parse().unwrap_or_else(|_| {
        eprintln!("Track number must be an integer, got {:?}", args[2]);
        process::exit(1);
    });
    let gain_db: i16 = args
        .iter()
        .position(|a| a == "--gain")
        .and_then(|i| args.get(i + 1))
        .map(|s| {
            s.parse().unwrap_or_else(|_| {
                eprintln!("--gain expects a dB value, got {:?}", s);
                process::exit(1);
            })
        })
        .unwrap_or(0);
    let wav_path = args
        .iter()
        .position(|a| a == "--wav")
        .and_then(|i| args.get(i + 1))
        .cloned();

    let mut player = load_bank(Path::new(dir));
    if player.catalog().info(track).is_none() {
        eprintln!(
            "No track {} (bank has {})",
            track,
            player.catalog().track_count()
        );
        process::exit(1);
    }

    if let Err(e) = player.open_voice(track, gain_db) {
        eprintln!("Failed to open track {}: {}", track, e);
        process::exit(1);
    }

    match wav_path {
        Some(path) => render_to_wav(&mut player, &path),
        None => play_audio(&mut player),
    }
}

fn load_bank(dir: &Path) -> Player<MemDisk> {
    let total_bytes: u64 = fs::read_dir(dir)
        .unwrap_or_else(|e| {
            eprintln!("Failed to read {}: {}", dir.display(), e);
            process::exit(1);
        })
        .filter_map(|e| e.ok())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum();
    // One spare block per file covers the block-alignment padding.
    let blocks = (total_bytes / 512 + 64) as u32;

    let mut disk = MemDisk::new(blocks);
    let mut catalog = Catalog::new();
    let loaded = catalog.scan_dir(&mut disk, dir).unwrap_or_else(|e| {
        eprintln!("Failed to load bank from {}: {}", dir.display(), e);
        process::exit(1);
    });
    if loaded == 0 {
        eprintln!("No .pcm or .adp files in {}", dir.display());
        process::exit(1);
    }
    info!("loaded {} tracks from {}", loaded, dir.display());
    Player::new(disk, catalog)
}

fn play_audio(player: &mut Player<MemDisk>) {
    let (mut output, consumer) = CpalOutput::new().unwrap_or_else(|e| {
        eprintln!("Audio init failed: {}", e);
        process::exit(1);
    });
    if let Err(e) = output.build_stream(consumer) {
        eprintln!("Audio stream failed: {}", e);
        process::exit(1);
    }
    let _ = output.start();
    println!("Playing... (ctrl-c to quit)");

    while player.active_voices() > 0 {
        if let Err(e) = player.feed_step() {
            eprintln!("Storage failed: {}", e);
            process::exit(1);
        }
        let quantum = *player.mix_quantum();
        let _ = output.write(&quantum);
    }

    // Let the device drain what the callback has not played yet.
    std::thread::sleep(Duration::from_millis(200));
    let _ = output.stop();
    println!("Done.");
}

fn render_to_wav(player: &mut Player<MemDisk>, path: &str) {
    // Cap looping tracks at five minutes.
    let max_frames = SAMPLE_RATE as usize * 300;
    println!("Rendering to {} at {} Hz...", path, SAMPLE_RATE);

    let frames = player.render_frames(max_frames).unwrap_or_else(|e| {
        eprintln!("Render failed: {}", e);
        process::exit(1);
    });
    let wav = frames_to_wav(&frames, SAMPLE_RATE);
    println!(
        "Rendered {} frames ({} quanta)",
        frames.len(),
        frames.len().div_ceil(QUANTUM_FRAMES)
    );

    fs::write(path, &wav).unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {}", path, e);
        process::exit(1);
    });
    println!("Done.");
}
