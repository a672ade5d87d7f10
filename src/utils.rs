use std::{future::pending, pin::Pin};

use tokio::time::Sleep;

/// Wait for a one-shot timer and clear it. Pends forever when nothing is armed.
///
/// Cancel safe: dropping the future leaves the timer armed.
pub async fn one_shot(slot: &mut Option<Pin<Box<Sleep>>>) {
    match slot.as_mut() {
        Some(timer) => {
            timer.as_mut().await;
            *slot = None;
        }
        None => pending().await,
    }
}
