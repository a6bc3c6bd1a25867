//! Bounded in-memory signal store
//!
//! Holds the most recently dispatched signals, newest first. The store is
//! the only state shared between the scanner and the signals API, so reads
//! take a point-in-time snapshot and never block the scan loop.

use crate::types::StoredSignal;
use std::collections::VecDeque;
use tokio::sync::RwLock;

pub struct SignalStore {
    signals: RwLock<VecDeque<StoredSignal>>,
    capacity: usize,
}

impl SignalStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            signals: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Insert at the head, silently evicting the oldest entry beyond
    /// capacity
    pub async fn push(&self, signal: StoredSignal) {
        let mut signals = self.signals.write().await;
        signals.push_front(signal);
        signals.truncate(self.capacity);
    }

    /// Current contents, most recent first
    pub async fn snapshot(&self) -> Vec<StoredSignal> {
        self.signals.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.signals.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.signals.read().await.is_empty()
    }
}
