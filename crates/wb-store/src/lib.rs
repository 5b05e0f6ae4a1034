//! Block storage and the track catalog.
//!
//! Storage is addressed in fixed-size blocks behind the
//! [`BlockDevice`] trait; the [`Catalog`] maps track numbers to byte
//! ranges on the device and hands out [`TrackStream`] read cursors.

mod catalog;
mod device;

pub use catalog::{Catalog, TrackFormat, TrackInfo, TrackStream};
pub use device::{BlockDevice, MemDisk, StoreError};
