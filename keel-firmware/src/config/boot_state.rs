//! GPIO boot-state persistence
//!
//! The settings subsystem stores the boot levels as postcard binary data.
//! This side only reads them; anything unreadable yields the compiled
//! default (every pin left untouched).

use defmt::*;

use keel_core::GpioBootState;
use keel_hal::{FlashError, FlashStorage, StorageKey};

/// Largest serialized boot state
const MAX_BOOT_STATE_SIZE: usize = 64;

/// Boot-state load errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootStateError {
    /// Flash operation failed
    Flash(FlashError),
    /// Deserialization failed
    Deserialize,
}

impl From<FlashError> for BootStateError {
    fn from(e: FlashError) -> Self {
        BootStateError::Flash(e)
    }
}

async fn read_boot_state<S: FlashStorage>(storage: &mut S) -> Result<GpioBootState, BootStateError> {
    let mut buffer = [0u8; MAX_BOOT_STATE_SIZE];
    let len = storage.read(StorageKey::GpioBootState, &mut buffer).await?;

    debug!("Read {} bytes of boot state from flash", len);

    postcard::from_bytes(&buffer[..len]).map_err(|_| BootStateError::Deserialize)
}

/// Load the persisted boot state, or the default when there is none
pub async fn load_boot_state<S: FlashStorage>(storage: &mut S) -> GpioBootState {
    match read_boot_state(storage).await {
        Ok(state) => {
            info!("Loaded GPIO boot state from flash");
            state
        }
        Err(BootStateError::Flash(FlashError::NotFound)) => {
            debug!("No GPIO boot state in flash, using defaults");
            GpioBootState::default()
        }
        Err(e) => {
            warn!("GPIO boot state unreadable: {:?}, using defaults", e);
            GpioBootState::default()
        }
    }
}
