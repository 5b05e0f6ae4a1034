//! Track catalog: maps track numbers to byte ranges on the device.

use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use wb_dsp::BLOCK_BYTES;

use crate::device::{BlockDevice, StoreError};

/// On-disk encoding of a track's audio data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackFormat {
    /// Interleaved 16-bit LE stereo, 4 bytes per frame.
    Pcm,
    /// IMA ADPCM nibble stream, 2 mono samples per byte.
    Adpcm,
}

/// Catalog entry for one track.
#[derive(Clone, Copy, Debug)]
pub struct TrackInfo {
    pub size_bytes: u32,
    pub format: TrackFormat,
    pub looping: bool,
    pub locked: bool,
}

#[derive(Clone, Copy)]
struct Entry {
    info: TrackInfo,
    start_block: u32,
}

/// Read cursor over one track's blocks.
///
/// Holds only addresses; the caller supplies the device on each read,
/// so many streams can share one device sequentially.
pub struct TrackStream {
    start_block: u32,
    size_bytes: u32,
    next_block: u32,
}

impl TrackStream {
    /// Read the next block of the track. The final block carries
    /// trailing garbage past the track's byte size; the consumer is
    /// expected to cap by size.
    pub fn read_block<D: BlockDevice>(
        &mut self,
        device: &mut D,
        out: &mut [u8; BLOCK_BYTES],
    ) -> Result<(), StoreError> {
        device.read_block(self.next_block, out)?;
        self.next_block += 1;
        Ok(())
    }

    /// True once every block holding track bytes has been read.
    pub fn exhausted(&self) -> bool {
        let blocks = (self.size_bytes as usize).div_ceil(BLOCK_BYTES) as u32;
        self.next_block >= self.start_block + blocks
    }

    pub fn rewind(&mut self) {
        self.next_block = self.start_block;
    }

    pub fn size_bytes(&self) -> u32 {
        self.size_bytes
    }
}

/// Maps track numbers to device byte ranges.
pub struct Catalog {
    entries: Vec<Entry>,
    next_free_block: u32,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_free_block: 0,
        }
    }

    pub fn track_count(&self) -> usize {
        self.entries.len()
    }

    pub fn info(&self, index: usize) -> Option<TrackInfo> {
        self.entries.get(index).map(|e| e.info)
    }

    /// Write `data` to the device block-aligned and register it as the
    /// next track. Returns the new track index.
    pub fn add_track<D: BlockDevice>(
        &mut self,
        device: &mut D,
        data: &[u8],
        format: TrackFormat,
        looping: bool,
        locked: bool,
    ) -> Result<usize, StoreError> {
        let start_block = self.next_free_block;
        let mut block = [0u8; BLOCK_BYTES];
        for (i, chunk) in data.chunks(BLOCK_BYTES).enumerate() {
            block[..chunk.len()].copy_from_slice(chunk);
            block[chunk.len()..].fill(0);
            device.write_block(start_block + i as u32, &block)?;
        }
        let blocks = data.len().div_ceil(BLOCK_BYTES) as u32;
        self.next_free_block += blocks;

        let index = self.entries.len();
        self.entries.push(Entry {
            info: TrackInfo {
                size_bytes: data.len() as u32,
                format,
                looping,
                locked,
            },
            start_block,
        });
        debug!(
            "track {}: {} bytes in {} blocks at block {}",
            index,
            data.len(),
            blocks,
            start_block
        );
        Ok(index)
    }

    /// Open a read cursor over a track's blocks.
    pub fn open(&self, index: usize) -> Option<TrackStream> {
        self.entries.get(index).map(|e| TrackStream {
            start_block: e.start_block,
            size_bytes: e.info.size_bytes,
            next_block: e.start_block,
        })
    }

    /// Load every `.pcm` and `.adp` file under `dir` onto the device,
    /// in filename order. A `_loop` suffix in the stem marks the track
    /// looping, `_lock` marks it protected from stop-all.
    pub fn scan_dir<D: BlockDevice>(
        &mut self,
        device: &mut D,
        dir: &Path,
    ) -> Result<usize, StoreError> {
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("pcm") | Some("adp")
                )
            })
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            let format = match path.extension().and_then(|e| e.to_str()) {
                Some("adp") => TrackFormat::Adpcm,
                _ => TrackFormat::Pcm,
            };
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            let looping = stem.contains("_loop");
            let locked = stem.contains("_lock");

            let data = match fs::read(&path) {
                Ok(d) => d,
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if data.is_empty() {
                warn!("skipping {}: empty file", path.display());
                continue;
            }
            let index = self.add_track(device, &data, format, looping, locked)?;
            info!(
                "track {} <- {} ({} bytes, {:?}{}{})",
                index,
                path.display(),
                data.len(),
                format,
                if looping { ", loop" } else { "" },
                if locked { ", lock" } else { "" },
            );
            loaded += 1;
        }
        Ok(loaded)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
