//! Single-slot rebuild scheduling.
//!
//! Events that arrive while a rebuild runs stay in the channel. When the
//! rebuild finishes they are drained together, so any burst of changes turns
//! into exactly one follow-up rebuild.

use std::time::Duration;

use tokio::sync::mpsc;

/// Folds bursts of events into batches.
pub struct CoalescingQueue<T> {
    rx: mpsc::Receiver<T>,
    settle: Duration,
}

impl<T> CoalescingQueue<T> {
    pub fn new(rx: mpsc::Receiver<T>) -> Self {
        Self {
            rx,
            settle: Duration::ZERO,
        }
    }

    /// Wait this long after the first event before draining, so editors that
    /// write several files at once produce a single batch.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Wait for the next event and return it together with everything queued
    /// behind it. Returns `None` once every sender is gone.
    pub async fn next_batch(&mut self) -> Option<Vec<T>> {
        let first = self.rx.recv().await?;

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let mut batch = vec![first];
        while let Ok(event) = self.rx.try_recv() {
            batch.push(event);
        }
        Some(batch)
    }
}
