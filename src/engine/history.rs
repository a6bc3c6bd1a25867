//! Bounded per-pair snapshot history

use crate::types::Snapshot;
use std::collections::{HashMap, VecDeque};

/// Sliding windows of recent snapshots, one per pair, oldest first.
/// Windows are created lazily on first admitted snapshot and live for the
/// process lifetime.
pub struct HistoryStore {
    windows: HashMap<String, VecDeque<Snapshot>>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            windows: HashMap::new(),
            capacity,
        }
    }

    /// Append a snapshot, evicting the oldest entry once at capacity
    pub fn append(&mut self, pair: &str, snapshot: Snapshot) {
        let window = self
            .windows
            .entry(pair.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));

        if window.len() >= self.capacity {
            window.pop_front();
        }
        window.push_back(snapshot);
    }

    /// The most recent entry, i.e. the one prior to an in-progress append
    pub fn previous(&self, pair: &str) -> Option<&Snapshot> {
        self.windows.get(pair).and_then(|window| window.back())
    }

    /// The full bounded sequence for modules needing trend context
    pub fn window(&self, pair: &str) -> Option<&VecDeque<Snapshot>> {
        self.windows.get(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn snapshot(price: f64, minute: u32) -> Snapshot {
        Snapshot {
            last_price: price,
            quote_volume: 2_000_000.0,
            buy_volume: 1_000_000.0,
            sell_volume: 1_000_000.0,
            observed_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_window_never_exceeds_capacity() {
        let mut history = HistoryStore::new(3);
        for i in 0..10 {
            history.append("btc_idr", snapshot(100.0 + i as f64, i));
        }

        let window = history.window("btc_idr").unwrap();
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_fifo_eviction_keeps_chronological_order() {
        let mut history = HistoryStore::new(3);
        for i in 0..5 {
            history.append("btc_idr", snapshot(100.0 + i as f64, i));
        }

        let window = history.window("btc_idr").unwrap();
        let prices: Vec<f64> = window.iter().map(|s| s.last_price).collect();
        assert_eq!(prices, vec![102.0, 103.0, 104.0]);
        assert!(window
            .iter()
            .zip(window.iter().skip(1))
            .all(|(a, b)| a.observed_at < b.observed_at));
    }

    #[test]
    fn test_previous_is_last_entry_before_append() {
        let mut history = HistoryStore::new(3);
        assert!(history.previous("btc_idr").is_none());

        history.append("btc_idr", snapshot(100.0, 0));
        assert_eq!(history.previous("btc_idr").unwrap().last_price, 100.0);

        history.append("btc_idr", snapshot(101.0, 1));
        assert_eq!(history.previous("btc_idr").unwrap().last_price, 101.0);
    }

    #[test]
    fn test_pairs_are_independent() {
        let mut history = HistoryStore::new(3);
        history.append("btc_idr", snapshot(100.0, 0));
        history.append("eth_idr", snapshot(50.0, 0));

        assert_eq!(history.window("btc_idr").unwrap().len(), 1);
        assert_eq!(history.window("eth_idr").unwrap().len(), 1);
        assert!(history.window("doge_idr").is_none());
    }
}
