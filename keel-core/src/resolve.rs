//! Directory resolver
//!
//! Maps (kind, instance) to where the record lives. The root directory is
//! its own case: it is always at offset 0 and only its fixed part is known
//! before its header has been read.

use crate::registry::descriptor;
use keel_protocol::directory::DIRECTORY_FIXED_LEN;
use keel_protocol::{ComponentType, RootDirectory};

/// Byte range of a record in the EEPROM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Location {
    pub offset: u32,
    /// Declared or provisional length
    pub length: u32,
}

/// How a location was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    /// Root directory; length is provisional
    Root(Location),
    /// Listed in the root directory
    Listed(Location),
    /// Registry default, used when no directory could be read
    Default(Location),
}

impl Resolution {
    pub fn location(&self) -> Location {
        match *self {
            Resolution::Root(l) | Resolution::Listed(l) | Resolution::Default(l) => l,
        }
    }
}

/// No entry for the requested instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NotFound;

/// The `instance`-th entry for `component`, in stored order
pub fn find(
    directory: &RootDirectory,
    component: ComponentType,
    instance: usize,
) -> Result<Location, NotFound> {
    directory
        .entries_of(component)
        .nth(instance)
        .map(|e| Location {
            offset: e.location,
            length: e.length,
        })
        .ok_or(NotFound)
}

/// Resolve a record location, with or without a root directory
pub fn resolve(
    directory: Option<&RootDirectory>,
    component: ComponentType,
    instance: usize,
) -> Result<Resolution, NotFound> {
    if component == ComponentType::RootDirectory {
        return match instance {
            0 => Ok(Resolution::Root(Location {
                offset: 0,
                length: DIRECTORY_FIXED_LEN as u32,
            })),
            _ => Err(NotFound),
        };
    }

    match directory {
        Some(dir) => find(dir, component, instance).map(Resolution::Listed),
        None if instance == 0 => {
            let d = descriptor(component);
            Ok(Resolution::Default(Location {
                offset: d.default_location,
                length: d.fixed_len() as u32,
            }))
        }
        None => Err(NotFound),
    }
}
