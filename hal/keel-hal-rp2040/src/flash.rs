//! Flash settings reader for RP2040
//!
//! The settings subsystem keeps a sequential-storage map in the last 64KB
//! of flash. Boot only reads it.
//!
//! Implements the `FlashStorage` trait from `keel-hal`.

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

// Re-export shared types from keel-hal
pub use keel_hal::flash::{FlashError, StorageKey};

/// Flash storage configuration
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB flash
pub const CONFIG_PARTITION_SIZE: usize = 64 * 1024; // 64KB for settings
pub const CONFIG_PARTITION_START: usize = FLASH_SIZE - CONFIG_PARTITION_SIZE;

/// Flash range for the settings partition
pub const CONFIG_RANGE: core::ops::Range<u32> =
    (CONFIG_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Largest stored item
const ITEM_BUFFER_LEN: usize = 256;

/// RP2040 flash settings reader
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
}

impl<'d> Rp2040FlashStorage<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }

    /// 64-bit unique id of the flash chip
    pub fn unique_id(&mut self) -> Result<[u8; 8], FlashError> {
        let mut uid = [0u8; 8];
        self.flash
            .blocking_unique_id(&mut uid)
            .map_err(|_| FlashError::Flash)?;
        Ok(uid)
    }

    /// Chip id for the identity fallback: low 32 bits of the unique id
    pub fn chip_id(&mut self) -> Result<u32, FlashError> {
        let uid = self.unique_id()?;
        Ok(u32::from_be_bytes([uid[4], uid[5], uid[6], uid[7]]))
    }
}

impl<'d> keel_hal::FlashStorage for Rp2040FlashStorage<'d> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let mut data_buffer = [0u8; ITEM_BUFFER_LEN];

        let result = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            CONFIG_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &key,
        )
        .await;

        match result {
            Ok(Some(data)) => {
                let len = data.len();
                let dest = buffer.get_mut(..len).ok_or(FlashError::BufferTooSmall)?;
                dest.copy_from_slice(data);
                Ok(len)
            }
            Ok(None) => Err(FlashError::NotFound),
            Err(_) => Err(FlashError::Storage),
        }
    }
}
