//! Info query task
//!
//! Answers board-information queries from the command channel out of the
//! state read at boot.

use defmt::*;

use keel_core::{answer, EepromState};

use crate::channels::{INFO_REQUESTS, INFO_RESPONSES};

/// Info query task
#[embassy_executor::task]
pub async fn info_task(state: &'static EepromState) {
    info!("Info task started");

    loop {
        let query = INFO_REQUESTS.receive().await;
        let response = answer(state, query);
        trace!("Info {}: {}", query, response.as_str());
        INFO_RESPONSES.send(response).await;
    }
}
