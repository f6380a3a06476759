//! EEPROM drivers

mod at24;

pub use at24::{At24Eeprom, At24Error, MAX_PAGE_SIZE, MAX_RETRIES};
