//! Info query responder
//!
//! Answers the `get/info/...` commands that report what was read from the
//! board EEPROMs. Answers are short ASCII strings.

use crate::registry::MAX_MODULES;
use crate::state::{EepromState, ModuleBoard};
use core::fmt::Write;

/// Longest answer
pub const ANSWER_MAX_LEN: usize = 64;

/// Answer when the information was not read
pub const UNKNOWN: &str = "unknown";

/// A board-information query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InfoQuery {
    Identity,
    Serial,
    /// `code:subcode`
    HwInfo,
    ChipId,
    Mac,
    Modules,
}

impl InfoQuery {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "identity" | "name" => Some(InfoQuery::Identity),
            "serial" => Some(InfoQuery::Serial),
            "hw_info" | "status" => Some(InfoQuery::HwInfo),
            "chip_id" | "chipid" => Some(InfoQuery::ChipId),
            "mac" => Some(InfoQuery::Mac),
            "modules" => Some(InfoQuery::Modules),
            _ => None,
        }
    }
}

/// Answer `query` from the boot state
pub fn answer(state: &EepromState, query: InfoQuery) -> heapless::String<ANSWER_MAX_LEN> {
    let mut out = heapless::String::new();
    // every answer below fits in ANSWER_MAX_LEN
    let _ = match query {
        InfoQuery::Identity => out.push_str(
            state
                .identity
                .as_ref()
                .map(|id| id.as_str())
                .unwrap_or(UNKNOWN),
        ),
        InfoQuery::Serial => out.push_str(
            state
                .main_board
                .as_ref()
                .and_then(|b| b.common.serial())
                .or_else(|| state.main_module.as_ref().and_then(|m| m.common.serial()))
                .unwrap_or(UNKNOWN),
        ),
        InfoQuery::HwInfo => out.push_str(state.status_string().as_str()),
        InfoQuery::ChipId => match state.main_board.as_ref() {
            Some(board) => write!(out, "{:06x}", board.chip_id_u32()).map_err(|_| ()),
            None => out.push_str(UNKNOWN),
        },
        InfoQuery::Mac => match state.main_board.as_ref() {
            Some(board) => write_mac(&mut out, &board.mac1).map_err(|_| ()),
            None => out.push_str(UNKNOWN),
        },
        InfoQuery::Modules => write_modules(&mut out, state).map_err(|_| ()),
    };
    out
}

fn write_mac(out: &mut impl Write, mac: &[u8; 6]) -> core::fmt::Result {
    for (i, byte) in mac.iter().enumerate() {
        if i > 0 {
            out.write_char(':')?;
        }
        write!(out, "{:02x}", byte)?;
    }
    Ok(())
}

/// One entry per socket: `-` empty, `?` no board, `hat`, or the module type
fn write_modules(out: &mut impl Write, state: &EepromState) -> core::fmt::Result {
    for slot in 0..MAX_MODULES {
        if slot > 0 {
            out.write_char(',')?;
        }
        match (state.module(slot), state.module_board(slot)) {
            (None, _) => out.write_char('-')?,
            (Some(_), None) => out.write_char('?')?,
            (Some(_), Some(ModuleBoard::Hat(_))) => out.write_str("hat")?,
            (Some(_), Some(ModuleBoard::Native(board))) => {
                write!(out, "{:03x}", board.main_module.module_type.0)?
            }
        }
    }
    Ok(())
}
