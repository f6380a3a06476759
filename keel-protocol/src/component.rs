//! Record kinds and their wire identifiers

/// Largest record the firmware will read in one piece
pub const MAX_COMPONENT_SIZE: usize = 1536;

/// Number of record kinds
pub const COMPONENT_TYPE_COUNT: usize = 7;

/// Magic numbers, one per record kind
pub mod magic {
    pub const ROOT_DIRECTORY: u32 = 0xBC13_EE7A;
    pub const MAIN_BOARD: u32 = 0xA140_C5AD;
    pub const MAIN_BOARD_MODULE: u32 = 0x498A_F75E;
    pub const SDK_INIT_DATA: u32 = 0xB3B8_D62C;
    pub const GPIO_PINS: u32 = 0x8A60_EBE8;
    pub const MAIN_MODULE: u32 = 0xEB64_38DC;
    pub const MAIN_MODULE_PINS: u32 = 0x9F99_EB64;
}

/// Record kind, as stored in directory entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum ComponentType {
    /// Root directory ("info"), always at offset 0
    RootDirectory = 0,
    /// Main board identity and calibration
    MainBoard = 1,
    /// A module socket on the main board, as seen from the main board
    MainBoardModule = 2,
    /// Opaque blob handed to the bootloader
    SdkInitData = 3,
    /// Main board GPIO description
    GpioPins = 4,
    /// Identity of a module board, stored on the module's own EEPROM
    MainModule = 5,
    /// Header pins of a module board
    MainModulePins = 6,
}

impl ComponentType {
    /// All kinds, in type id order
    pub const ALL: [ComponentType; COMPONENT_TYPE_COUNT] = [
        ComponentType::RootDirectory,
        ComponentType::MainBoard,
        ComponentType::MainBoardModule,
        ComponentType::SdkInitData,
        ComponentType::GpioPins,
        ComponentType::MainModule,
        ComponentType::MainModulePins,
    ];

    /// Create from the directory type field
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Table index
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Magic number carried in the record header
    pub const fn magic(self) -> u32 {
        match self {
            ComponentType::RootDirectory => magic::ROOT_DIRECTORY,
            ComponentType::MainBoard => magic::MAIN_BOARD,
            ComponentType::MainBoardModule => magic::MAIN_BOARD_MODULE,
            ComponentType::SdkInitData => magic::SDK_INIT_DATA,
            ComponentType::GpioPins => magic::GPIO_PINS,
            ComponentType::MainModule => magic::MAIN_MODULE,
            ComponentType::MainModulePins => magic::MAIN_MODULE_PINS,
        }
    }

    /// Kind whose magic is `magic`
    pub fn from_magic(magic: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.magic() == magic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_id_roundtrip() {
        for ty in ComponentType::ALL {
            assert_eq!(ComponentType::from_u32(ty.as_u32()), Some(ty));
        }
        assert_eq!(ComponentType::from_u32(7), None);
    }

    #[test]
    fn test_magics_unique() {
        for a in ComponentType::ALL {
            assert_eq!(ComponentType::from_magic(a.magic()), Some(a));
        }
        assert_eq!(ComponentType::from_magic(0), None);
    }
}
