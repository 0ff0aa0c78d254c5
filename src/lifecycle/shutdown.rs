//! Shutdown broadcast.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

/// Fans a single shutdown event out to every background loop and server.
///
/// Receivers subscribed after [`Shutdown::trigger`] miss the broadcast, so
/// late starters should check [`Shutdown::is_triggered`] first.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    triggered: AtomicBool,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. Repeated calls are no-ops.
    pub fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::AcqRel) {
            tracing::info!(subscribers = self.tx.receiver_count(), "Shutdown triggered");
            let _ = self.tx.send(());
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Subscribers still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
