//! Read issue bitmask
//!
//! One record can fail several checks at once (wrong version and bad
//! checksum, say), so problems accumulate into a bitmask instead of
//! short-circuiting on the first.

use bitflags::bitflags;
use keel_protocol::ComponentType;

bitflags! {
    /// Problems found while reading one record instance
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ReadIssues: u32 {
        /// Bus transaction failed
        const BUS = 0x001;
        const MAGIC = 0x002;
        const VERSION = 0x004;
        const CHECKSUM = 0x008;
        const LENGTH = 0x010;
        /// Buffer cannot hold the record's fixed part
        const BUF_LEN_MAIN = 0x020;
        /// Buffer holds the header but not the whole record
        const BUF_LEN_COMP = 0x040;
        /// No directory entry for this instance
        const NOT_FOUND = 0x080;
        const STRUCT_SIZE = 0x100;
        /// Declared length above the maximum component size
        const COMP_TOO_BIG = 0x200;
        /// Magic belongs to a different record kind
        const TYPE_MISMATCH = 0x400;
        /// Accepted using an older layout's checksum span
        const LEGACY_SHAPE = 0x800;
    }
}

impl ReadIssues {
    /// Issues that still leave a usable record
    pub const NON_FATAL: Self = Self::BUF_LEN_COMP.union(Self::LEGACY_SHAPE);

    /// Whether these issues prevent producing a record
    pub fn is_fatal(self) -> bool {
        !self.difference(Self::NON_FATAL).is_empty()
    }

    /// Nothing was there to read; not a corruption
    pub fn is_absent(self) -> bool {
        self.contains(Self::NOT_FOUND)
    }
}

/// A record instance that could not be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadFailure {
    pub component: ComponentType,
    pub instance: usize,
    /// Bitmask of [`ReadIssues`]
    pub issues: u32,
}

impl ReadFailure {
    pub fn new(component: ComponentType, instance: usize, issues: ReadIssues) -> Self {
        Self {
            component,
            instance,
            issues: issues.bits(),
        }
    }

    pub fn issues(&self) -> ReadIssues {
        ReadIssues::from_bits_retain(self.issues)
    }
}
