//! In-process "there is outbox work" signal
//!
//! A channel with a single slot: `notify` never blocks, and any number of
//! pings between two waits collapse into one wake-up. The signal only cuts
//! latency; a waiter that times out must go and look anyway.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    Notified,
    TimedOut,
}

#[derive(Clone)]
pub struct OutboxNotifier {
    sender: mpsc::Sender<()>,
    receiver: Arc<Mutex<mpsc::Receiver<()>>>,
}

impl OutboxNotifier {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(1);
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Signal that new records were committed
    pub fn notify(&self) {
        // Full means a wake-up is already outstanding.
        let _ = self.sender.try_send(());
    }

    /// Wait for the next signal, at most `timeout`
    pub async fn wait(&self, timeout: Duration) -> WakeReason {
        let mut receiver = self.receiver.lock().await;
        match tokio::time::timeout(timeout, receiver.recv()).await {
            Ok(Some(())) => WakeReason::Notified,
            // The sender lives in self, so a closed channel is unreachable;
            // treat it like a timeout and let the caller poll.
            Ok(None) | Err(_) => WakeReason::TimedOut,
        }
    }
}

impl Default for OutboxNotifier {
    fn default() -> Self {
        Self::new()
    }
}
