//! EEPROM bus abstraction
//!
//! The boot path only ever needs "read these bytes from this chip at this
//! offset". Word addressing, chunking and retries belong to the transport.

/// Byte-addressed access to one or more EEPROMs on a shared bus
///
/// Calls are blocking and complete before returning; callers never issue
/// overlapping transactions.
pub trait EepromBus {
    /// Error type for bus operations
    type Error;

    /// Read `buf.len()` bytes starting at `offset` of the chip at `address`
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address of the EEPROM
    /// * `offset` - Byte offset within the EEPROM
    /// * `buf` - Buffer to fill
    fn read(&mut self, address: u8, offset: u32, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `data` starting at `offset` of the chip at `address`
    ///
    /// Only provisioning paths write; the boot path is read-only.
    fn write(&mut self, address: u8, offset: u32, data: &[u8]) -> Result<(), Self::Error>;
}

impl<T: EepromBus + ?Sized> EepromBus for &mut T {
    type Error = T::Error;

    fn read(&mut self, address: u8, offset: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        T::read(self, address, offset, buf)
    }

    fn write(&mut self, address: u8, offset: u32, data: &[u8]) -> Result<(), Self::Error> {
        T::write(self, address, offset, data)
    }
}
