//! Detection-and-alerting engine
//!
//! One scanner task owns all mutable per-pair state (history windows,
//! cooldown latches) and drives discrete, non-overlapping scan cycles:
//! normalize each ticker, feed history, run the detection modules, score and
//! select the best candidate, then dispatch through the cooldown gate.

pub mod detect;
pub mod history;


use crate::client::MarketFeed;
use crate::config::ScannerConfig;
use crate::error::Result;
use crate::news::NewsProvider;
use crate::notify::Notifier;
use crate::store::SignalStore;
use crate::types::{round_dp, Candidate, Snapshot, StoredSignal};
use chrono::{DateTime, Utc};
use history::HistoryStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

pub struct Scanner {
    feed: Arc<dyn MarketFeed>,
    news: Arc<dyn NewsProvider>,
    notifier: Notifier,
    store: Arc<SignalStore>,
    config: ScannerConfig,
    history: HistoryStore,
    cooldowns: HashMap<String, DateTime<Utc>>,
    dry_run: bool,
}

impl Scanner {
    pub fn new(
        feed: Arc<dyn MarketFeed>,
        news: Arc<dyn NewsProvider>,
        notifier: Notifier,
        store: Arc<SignalStore>,
        config: ScannerConfig,
        dry_run: bool,
    ) -> Self {
        let history = HistoryStore::new(config.history_len);
        Self {
            feed,
            news,
            notifier,
            store,
            config,
            history,
            cooldowns: HashMap::new(),
            dry_run,
        }
    }

    /// Run scan cycles at the configured interval until the process exits.
    /// Cycles never overlap: the next tick is awaited only after the full
    /// per-pair loop completes.
    pub async fn run(mut self) {
        tracing::info!(
            "scanner started, polling every {}s",
            self.config.poll_interval_secs
        );

        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.poll_interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.run_cycle(Utc::now()).await;
        }
    }

    /// One full scan over the summary feed. A failed feed pull skips the
    /// whole cycle; a failure on one pair skips only that pair.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) {
        let tickers = match self.feed.fetch_summaries().await {
            Ok(tickers) => tickers,
            Err(e) => {
                tracing::warn!("summary feed unavailable: {e}");
                return;
            }
        };

        for (pair, raw) in &tickers {
            if let Err(e) = self.process_pair(pair, raw, now).await {
                tracing::error!("error processing {pair}: {e}");
            }
        }
    }

    async fn process_pair(&mut self, pair: &str, raw: &Value, now: DateTime<Utc>) -> Result<()> {
        if !pair.ends_with(&self.config.quote_suffix) {
            return Ok(());
        }

        let Some(snapshot) = Snapshot::from_raw(raw, now) else {
            tracing::debug!("skipping {pair}: unusable ticker fields");
            return Ok(());
        };
        if snapshot.quote_volume < self.config.min_quote_volume {
            return Ok(());
        }

        let prev = self.history.previous(pair).cloned();
        self.history.append(pair, snapshot.clone());

        // A cooling pair still feeds history; detection and dispatch wait
        // out the latch.
        if self.cooling(pair, now) {
            return Ok(());
        }

        let candidates = match self.history.window(pair) {
            Some(window) => detect::run_all(&snapshot, prev.as_ref(), window),
            None => return Ok(()),
        };
        if candidates.is_empty() {
            return Ok(());
        }

        // One book probe per candidate-bearing pair; failure degrades to a
        // neutral imbalance rather than dropping the candidates.
        let imbalance = match self.feed.fetch_depth(pair).await {
            Ok(depth) => depth.imbalance_pct(),
            Err(e) => {
                tracing::debug!("depth probe failed for {pair}: {e}");
                0.0
            }
        };
        let news = self.news.has_news(pair).await.unwrap_or(false);

        // First strictly-greatest priority wins, so earlier modules take
        // ties.
        let mut best: Option<(&Candidate, f64)> = None;
        for candidate in &candidates {
            let priority = candidate.priority(imbalance, news);
            if best.as_ref().map_or(true, |(_, top)| priority > *top) {
                best = Some((candidate, priority));
            }
        }

        let Some((candidate, priority)) = best else {
            return Ok(());
        };
        if priority < self.config.alert_threshold {
            return Ok(());
        }

        self.dispatch(pair, candidate, priority, imbalance, news, now).await;
        Ok(())
    }

    async fn dispatch(
        &mut self,
        pair: &str,
        candidate: &Candidate,
        priority: f64,
        imbalance: f64,
        news: bool,
        now: DateTime<Utc>,
    ) {
        let signal = StoredSignal {
            id: Uuid::new_v4(),
            mode: candidate.mode,
            pair: pair.to_string(),
            time: now,
            entry: candidate.entry,
            take_profit: candidate.take_profit,
            stop_loss: candidate.stop_loss,
            priority: round_dp(priority, 1),
            imbalance,
            news,
        };

        tracing::info!(
            "NEW SIGNAL: {} on {} (priority {})",
            signal.mode.as_str().to_uppercase(),
            pair.to_uppercase(),
            signal.priority
        );

        self.store.push(signal.clone()).await;
        self.cooldowns.insert(pair.to_string(), now);

        if self.dry_run {
            return;
        }
        // Best effort: a delivery failure is logged and never retried, and
        // the store insert and cooldown latch above stand regardless.
        if let Err(e) = self.notifier.signal(&signal).await {
            tracing::warn!("failed to deliver alert for {pair}: {e}");
        }
    }

    fn cooling(&self, pair: &str, now: DateTime<Utc>) -> bool {
        match self.cooldowns.get(pair) {
            Some(last) => (now - *last) < chrono::Duration::seconds(self.config.cooldown_secs),
            None => false,
        }
    }
}
