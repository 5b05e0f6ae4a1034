//! Block-addressed storage devices.

use std::fmt;
use std::io;

use wb_dsp::BLOCK_BYTES;

/// Storage failures. A timeout is fatal to the caller; there is no
/// retry from inside the streaming core.
#[derive(Debug)]
pub enum StoreError {
    /// Block address beyond the device.
    OutOfRange { block: u32, count: u32 },
    /// The device did not complete a transfer in time.
    Timeout,
    /// Underlying I/O failure.
    Io(io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::OutOfRange { block, count } => {
                write!(f, "block {} out of range (device has {})", block, count)
            }
            StoreError::Timeout => write!(f, "storage transfer timed out"),
            StoreError::Io(e) => write!(f, "storage i/o error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// Block-addressed storage. Transfers are whole blocks only.
pub trait BlockDevice {
    fn block_count(&self) -> u32;

    fn read_block(&mut self, block: u32, out: &mut [u8; BLOCK_BYTES]) -> Result<(), StoreError>;

    fn write_block(&mut self, block: u32, data: &[u8; BLOCK_BYTES]) -> Result<(), StoreError>;
}

/// RAM-backed device, the default for hosted use and tests.
pub struct MemDisk {
    blocks: Vec<[u8; BLOCK_BYTES]>,
}

impl MemDisk {
    pub fn new(block_count: u32) -> Self {
        Self {
            blocks: vec![[0; BLOCK_BYTES]; block_count as usize],
        }
    }

    fn check(&self, block: u32) -> Result<usize, StoreError> {
        if block < self.block_count() {
            Ok(block as usize)
        } else {
            Err(StoreError::OutOfRange {
                block,
                count: self.block_count(),
            })
        }
    }
}

impl BlockDevice for MemDisk {
    fn block_count(&self) -> u32 {
        self.blocks.len() as u32
    }

    fn read_block(&mut self, block: u32, out: &mut [u8; BLOCK_BYTES]) -> Result<(), StoreError> {
        let i = self.check(block)?;
        out.copy_from_slice(&self.blocks[i]);
        Ok(())
    }

    fn write_block(&mut self, block: u32, data: &[u8; BLOCK_BYTES]) -> Result<(), StoreError> {
        let i = self.check(block)?;
        self.blocks[i].copy_from_slice(data);
        Ok(())
    }
}
