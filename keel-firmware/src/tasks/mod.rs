//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod info;
pub mod module_init;

pub use info::info_task;
pub use module_init::{module_init_task, SpawnScheduler};
