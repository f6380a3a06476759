//! GPIO output abstraction for boot-state defaults
//!
//! When no module board claims the socket pins, the firmware drives every
//! unreserved GPIO to its persisted boot level. Pins are addressed by number
//! because the numbers come from EEPROM data, not from the type system.

/// Errors from driving a pin by number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number not wired on this board
    NotAvailable,
    /// Pin already claimed by another function
    InUse,
}

/// Set of GPIOs that can be driven by number
pub trait BootPins {
    /// Number of GPIOs the bank can address (pins `0..count()`)
    fn count(&self) -> u8;

    /// Configure `pin` as an output and drive it to `high`
    fn drive(&mut self, pin: u8, high: bool) -> Result<(), PinError>;
}
