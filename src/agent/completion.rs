//! Single-slot completion queue.
//!
//! Exit notices and disconnections race to end a session. The slot accepts
//! the first terminal signal and silently drops the rest (at-most-once
//! delivery).

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::agent::types::CompletionSignal;

/// Producer side, shared by the event handlers.
#[derive(Clone)]
pub struct CompletionSlot {
    sender: Arc<Mutex<Option<oneshot::Sender<CompletionSignal>>>>,
}

/// Consumer side, owned by the session.
pub struct CompletionWaiter {
    receiver: oneshot::Receiver<CompletionSignal>,
}

/// Create a connected slot/waiter pair.
pub fn completion_slot() -> (CompletionSlot, CompletionWaiter) {
    let (sender, receiver) = oneshot::channel();
    (
        CompletionSlot {
            sender: Arc::new(Mutex::new(Some(sender))),
        },
        CompletionWaiter { receiver },
    )
}

impl CompletionSlot {
    /// Offer a terminal signal. Returns true if it was the first one.
    pub fn complete(&self, signal: CompletionSignal) -> bool {
        let Some(sender) = self.sender.lock().take() else {
            debug!(?signal, "Dropping terminal signal, session already completed");
            return false;
        };
        // A dropped waiter still counts as the slot being used up.
        let _ = sender.send(signal);
        true
    }

    /// Whether a terminal signal has already been accepted.
    pub fn is_completed(&self) -> bool {
        self.sender.lock().is_none()
    }
}

impl CompletionWaiter {
    /// Wait for the terminal signal.
    ///
    /// Returns `None` if `limit` elapses first. If every producer is gone
    /// without completing, the channel counts as closed.
    pub async fn wait(self, limit: Option<Duration>) -> Option<CompletionSignal> {
        let received = match limit {
            Some(limit) => tokio::time::timeout(limit, self.receiver).await.ok()?,
            None => self.receiver.await,
        };
        Some(received.unwrap_or_else(|_| CompletionSignal::ChannelClosed {
            error: "event channel closed without completion".to_string(),
        }))
    }
}
