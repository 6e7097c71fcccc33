//! Scheduling of mismatch reverts.
//!
//! The controller never sleeps. A `PendingRevert` is handed to the caller,
//! which waits out its delay here and feeds it back as
//! `SessionEvent::RevealElapsed`. The round token inside the revert makes
//! late deliveries harmless.

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

use super::events::SessionEvent;
use crate::modes::PendingRevert;

/// Wait out the reveal delay and return the revert.
pub async fn after_reveal(revert: PendingRevert) -> PendingRevert {
    tokio::time::sleep(revert.delay).await;
    revert
}

/// Spawn a task that sends `RevealElapsed` on `events` after the delay.
///
/// A closed channel means the session is gone; the revert is dropped.
pub fn spawn_reveal(revert: PendingRevert, events: UnboundedSender<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let revert = after_reveal(revert).await;
        if events.send(SessionEvent::RevealElapsed(revert)).is_err() {
            debug!(round = revert.round.0, "session closed before revert fired");
        }
    })
}
