//! TOML board description
//!
//! A main board description:
//! ```toml
//! [eeprom]
//! capacity = 16384
//! write_date = 0x20241019
//!
//! [main_board]
//! serial = "K0001"
//! code = 0x001
//! subcode = 0x002
//! chip_id = 0xa1b2c3
//! mac1_prefix = 0x5ccf7f
//!
//! [[module]]
//! port = 0
//! socket = "mezzanine"
//! address = 0x20
//!
//! [[module.pin]]
//! num = 1
//! usage = "gpio"
//! gpio = 4
//! ```
//!
//! A module board description replaces `[main_board]`, `[[module]]` and
//! `[[gpio_pin]]` with `[main_module]` and `[main_module_pins]`.

use keel_protocol::pin::{FurtherInfo, PinInfo, PinUse, Pulled};
use keel_protocol::records::SERIAL_LEN;
use keel_protocol::{ModuleType, SocketType};
use serde::Deserialize;

use crate::error::ProvisionError;

/// Serial numbers are right-aligned in this many characters, then NUL
pub const SERIAL_WIDTH: usize = SERIAL_LEN - 1;

/// Highest GPIO a pin may name
const MAX_GPIO: u8 = 16;

/// Whole board description
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardSpec {
    #[serde(default)]
    pub eeprom: EepromSpec,
    pub main_board: Option<MainBoardSpec>,
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleSpec>,
    #[serde(default, rename = "gpio_pin")]
    pub gpio_pins: Vec<PinSpec>,
    pub sdk_init_data: Option<SdkInitDataSpec>,
    pub main_module: Option<MainModuleSpec>,
    pub main_module_pins: Option<MainModulePinsSpec>,
}

/// Which EEPROM the description is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardKind {
    Main,
    Module,
}

impl BoardSpec {
    pub fn parse(text: &str) -> Result<Self, ProvisionError> {
        let spec: BoardSpec = toml::from_str(text)?;
        spec.kind()?;
        Ok(spec)
    }

    pub fn kind(&self) -> Result<BoardKind, ProvisionError> {
        match (&self.main_board, &self.main_module) {
            (Some(_), None) => Ok(BoardKind::Main),
            (None, Some(_)) => Ok(BoardKind::Module),
            _ => Err(ProvisionError::BoardKind),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EepromSpec {
    /// Chip size in bytes
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    /// 0xYYYYMMDD
    #[serde(default)]
    pub write_date: u32,
}

fn default_capacity() -> u32 {
    16 * 1024
}

impl Default for EepromSpec {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            write_date: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MainBoardSpec {
    pub serial: String,
    pub code: u32,
    pub subcode: u32,
    /// 24-bit chip id
    #[serde(default)]
    pub chip_id: u32,
    /// First three bytes of the station MAC; the rest is the chip id
    #[serde(default)]
    pub mac1_prefix: u32,
    /// First three bytes of the soft AP MAC
    #[serde(default)]
    pub mac2_prefix: u32,
    #[serde(default)]
    pub cpu_module: u32,
    #[serde(default)]
    pub flash_size_kb: u32,
    #[serde(default)]
    pub i2c_adc: u32,
    #[serde(default)]
    pub internal_adc: u32,
    /// Module sockets; defaults to the number of `[[module]]` entries
    pub module_count: Option<u32>,
}

impl MainBoardSpec {
    pub fn chip_id_bytes(&self) -> Result<[u8; 3], ProvisionError> {
        three_bytes("chip_id", self.chip_id)
    }

    /// MAC with the chip id in its low three bytes
    pub fn mac(&self, what: &'static str, prefix: u32) -> Result<[u8; 6], ProvisionError> {
        let [a, b, c] = three_bytes(what, prefix)?;
        let [d, e, f] = self.chip_id_bytes()?;
        Ok([a, b, c, d, e, f])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Socket {
    Mezzanine,
    Programmer,
    DoubleMezzanine,
    DoubleMezzanineProgrammer,
}

impl From<Socket> for SocketType {
    fn from(socket: Socket) -> Self {
        match socket {
            Socket::Mezzanine => SocketType::Mezzanine,
            Socket::Programmer => SocketType::Programmer,
            Socket::DoubleMezzanine => SocketType::DoubleMezzanine,
            Socket::DoubleMezzanineProgrammer => SocketType::DoubleMezzanineProgrammer,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleSpec {
    pub port: u32,
    pub socket: Socket,
    #[serde(default = "one")]
    pub header_count: u32,
    /// I2C address of the module
    pub address: u8,
    #[serde(default, rename = "pin")]
    pub pins: Vec<PinSpec>,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Usage {
    NotConnected,
    Reserved,
    Ground,
    #[serde(rename = "3v3")]
    Supply3v3,
    #[serde(rename = "5v")]
    Supply5v,
    Gpio,
    StatusLed,
    ResetHard,
    ResetSoft,
    InternalSda,
    InternalScl,
    Tout,
    Tx,
    Rx,
    UsbDPlus,
    UsbDMinus,
    WriteProtect,
    Address0,
    Address1,
    Address2,
    Jack1,
    Jack2,
    Jack3,
}

impl From<Usage> for PinUse {
    fn from(usage: Usage) -> Self {
        match usage {
            Usage::NotConnected => PinUse::NotConnected,
            Usage::Reserved => PinUse::Reserved,
            Usage::Ground => PinUse::Ground,
            Usage::Supply3v3 => PinUse::Supply3v3,
            Usage::Supply5v => PinUse::Supply5v,
            Usage::Gpio => PinUse::Gpio,
            Usage::StatusLed => PinUse::StatusLed,
            Usage::ResetHard => PinUse::ResetHard,
            Usage::ResetSoft => PinUse::ResetSoft,
            Usage::InternalSda => PinUse::InternalSda,
            Usage::InternalScl => PinUse::InternalScl,
            Usage::Tout => PinUse::Tout,
            Usage::Tx => PinUse::Tx,
            Usage::Rx => PinUse::Rx,
            Usage::UsbDPlus => PinUse::UsbDPlus,
            Usage::UsbDMinus => PinUse::UsbDMinus,
            Usage::WriteProtect => PinUse::WriteProtect,
            Usage::Address0 => PinUse::Address(0),
            Usage::Address1 => PinUse::Address(1),
            Usage::Address2 => PinUse::Address(2),
            Usage::Jack1 => PinUse::Jack(1),
            Usage::Jack2 => PinUse::Jack(2),
            Usage::Jack3 => PinUse::Jack(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pull {
    #[default]
    NotApplicable,
    Float,
    Ground,
    #[serde(rename = "3v3")]
    Supply3v3,
    #[serde(rename = "5v")]
    Supply5v,
}

impl From<Pull> for Pulled {
    fn from(pull: Pull) -> Self {
        match pull {
            Pull::NotApplicable => Pulled::NotApplicable,
            Pull::Float => Pulled::Float,
            Pull::Ground => Pulled::Ground,
            Pull::Supply3v3 => Pulled::Supply3v3,
            Pull::Supply5v => Pulled::Supply5v,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PinSpec {
    pub num: u32,
    /// Bitmask of headers the pin is on
    #[serde(default = "one")]
    pub header: u32,
    pub usage: Usage,
    /// Bitmask of module sockets the pin reaches
    #[serde(default)]
    pub module: u32,
    /// GPIO number for `usage = "gpio"`
    pub gpio: Option<u8>,
    #[serde(default)]
    pub pulled: Pull,
}

impl PinSpec {
    pub fn to_pin(&self) -> Result<PinInfo, ProvisionError> {
        let further_info = match self.gpio {
            Some(n) if n > MAX_GPIO => {
                return Err(ProvisionError::OutOfRange {
                    what: "gpio",
                    value: n as u64,
                })
            }
            Some(n) => FurtherInfo::gpio(n),
            None => FurtherInfo::NONE,
        };
        Ok(PinInfo {
            num: self.num,
            header_mask: self.header,
            usage: self.usage.into(),
            module_mask: self.module,
            further_info,
            pulled: self.pulled.into(),
        })
    }
}

pub fn to_pins(specs: &[PinSpec]) -> Result<Vec<PinInfo>, ProvisionError> {
    specs.iter().map(PinSpec::to_pin).collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SdkInitDataSpec {
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MainModuleSpec {
    pub serial: String,
    pub code: u32,
    pub subcode: u32,
    pub module_type: u32,
    pub socket: Socket,
    #[serde(default)]
    pub jack_used: bool,
}

impl MainModuleSpec {
    pub fn module_type(&self) -> ModuleType {
        ModuleType(self.module_type)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MainModulePinsSpec {
    #[serde(default = "one")]
    pub header_count: u32,
    #[serde(default, rename = "pin")]
    pub pins: Vec<PinSpec>,
}

/// Serial right-aligned in [`SERIAL_WIDTH`] characters
pub fn padded_serial(serial: &str) -> Result<String, ProvisionError> {
    if serial.is_empty() || serial.len() > SERIAL_WIDTH || !serial.is_ascii() {
        return Err(ProvisionError::Serial(serial.to_string()));
    }
    Ok(format!("{:>width$}", serial, width = SERIAL_WIDTH))
}

fn three_bytes(what: &'static str, value: u32) -> Result<[u8; 3], ProvisionError> {
    if value > 0x00FF_FFFF {
        return Err(ProvisionError::OutOfRange {
            what,
            value: value as u64,
        });
    }
    let [_, a, b, c] = value.to_be_bytes();
    Ok([a, b, c])
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: &str = r#"
        [eeprom]
        write_date = 0x20241019

        [main_board]
        serial = "K0001"
        code = 0x001
        subcode = 0x002
        chip_id = 0xa1b2c3
        mac1_prefix = 0x5ccf7f

        [[module]]
        port = 0
        socket = "mezzanine"
        address = 0x20

        [[module.pin]]
        num = 1
        usage = "gpio"
        gpio = 4
        pulled = "float"

        [[module.pin]]
        num = 2
        usage = "3v3"

        [[gpio_pin]]
        num = 7
        usage = "status_led"
    "#;

    #[test]
    fn test_parse_main_board() {
        let spec = BoardSpec::parse(MAIN).unwrap();
        assert_eq!(spec.kind().unwrap(), BoardKind::Main);
        assert_eq!(spec.eeprom.capacity, 16 * 1024);
        assert_eq!(spec.eeprom.write_date, 0x2024_1019);
        assert_eq!(spec.modules.len(), 1);
        assert_eq!(spec.modules[0].header_count, 1);
        assert_eq!(spec.modules[0].socket, Socket::Mezzanine);

        let pins = to_pins(&spec.modules[0].pins).unwrap();
        assert_eq!(pins[0].gpio_number(), Some(4));
        assert_eq!(pins[0].pulled, Pulled::Float);
        assert_eq!(pins[1].usage, PinUse::Supply3v3);
        assert_eq!(pins[1].pulled, Pulled::NotApplicable);
    }

    #[test]
    fn test_mac_takes_chip_id() {
        let spec = BoardSpec::parse(MAIN).unwrap();
        let board = spec.main_board.unwrap();
        assert_eq!(
            board.mac("mac1_prefix", board.mac1_prefix).unwrap(),
            [0x5c, 0xcf, 0x7f, 0xa1, 0xb2, 0xc3]
        );
    }

    #[test]
    fn test_needs_exactly_one_board_kind() {
        assert!(matches!(
            BoardSpec::parse("[eeprom]\ncapacity = 8192\n"),
            Err(ProvisionError::BoardKind)
        ));

        let both = r#"
            [main_board]
            serial = "A"
            code = 1
            subcode = 1

            [main_module]
            serial = "B"
            code = 0x101
            subcode = 0x101
            module_type = 0x101
            socket = "mezzanine"
        "#;
        assert!(matches!(
            BoardSpec::parse(both),
            Err(ProvisionError::BoardKind)
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let text = "[main_board]\nserial = \"A\"\ncode = 1\nsubcode = 1\ncolour = 3\n";
        assert!(matches!(
            BoardSpec::parse(text),
            Err(ProvisionError::Parse(_))
        ));
    }

    #[test]
    fn test_address_and_jack_usages() {
        assert_eq!(PinUse::from(Usage::Address2), PinUse::Address(2));
        assert_eq!(PinUse::from(Usage::Jack1), PinUse::Jack(1));
        assert_eq!(PinUse::from(Usage::Jack1).as_u32(), 21);
    }

    #[test]
    fn test_padded_serial() {
        assert_eq!(padded_serial("K0001").unwrap(), "          K0001");
        assert_eq!(padded_serial("K0001").unwrap().len(), SERIAL_WIDTH);
        assert!(padded_serial("").is_err());
        assert!(padded_serial("0123456789ABCDEF").is_err());
    }

    #[test]
    fn test_out_of_range_values() {
        let pin = PinSpec {
            num: 1,
            header: 1,
            usage: Usage::Gpio,
            module: 0,
            gpio: Some(17),
            pulled: Pull::Float,
        };
        assert!(matches!(
            pin.to_pin(),
            Err(ProvisionError::OutOfRange { what: "gpio", .. })
        ));
        assert!(three_bytes("chip_id", 0x0100_0000).is_err());
        assert_eq!(three_bytes("chip_id", 0x00AB_CDEF).unwrap(), [0xAB, 0xCD, 0xEF]);
    }
}
