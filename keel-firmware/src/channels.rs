//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use keel_core::query::{InfoQuery, ANSWER_MAX_LEN};

/// Channel capacity for info queries from the command channel
const INFO_CHANNEL_SIZE: usize = 4;

/// Board-information queries from the command channel
pub static INFO_REQUESTS: Channel<CriticalSectionRawMutex, InfoQuery, INFO_CHANNEL_SIZE> =
    Channel::new();

/// Answers to [`INFO_REQUESTS`], in request order
pub static INFO_RESPONSES: Channel<
    CriticalSectionRawMutex,
    heapless::String<ANSWER_MAX_LEN>,
    INFO_CHANNEL_SIZE,
> = Channel::new();
