//! Detection module set
//!
//! Six independent heuristics, each a pure function of the current snapshot
//! and either the single previous snapshot or the full window. All modules
//! run every cycle so several can fire at once for one pair; the scoring
//! layer picks the winner.

use crate::types::{Candidate, SignalMode, Snapshot, LOWCAP_PRICE};
use std::collections::VecDeque;

/// Minimum window length (current snapshot included) for breakout detection
const BREAKOUT_MIN_WINDOW: usize = 10;

type DetectFn = fn(&Snapshot, Option<&Snapshot>, &VecDeque<Snapshot>) -> Option<Candidate>;

/// Evaluation order doubles as the tie-break order for equal-priority
/// candidates.
const DETECTORS: [DetectFn; 6] = [
    detect_scalper,
    detect_micro_pump,
    detect_breakout,
    detect_accumulation,
    detect_rebound,
    detect_lowcap,
];

/// Evaluate every detection module against one pair's state
pub fn run_all(
    now: &Snapshot,
    prev: Option<&Snapshot>,
    window: &VecDeque<Snapshot>,
) -> Vec<Candidate> {
    DETECTORS
        .iter()
        .filter_map(|detect| detect(now, prev, window))
        .collect()
}

/// Fixed-increment heuristic score, monotone in signal strength
pub fn raw_score(now: &Snapshot, prev: &Snapshot) -> u32 {
    let mut score = 0;
    if now.last_price > prev.last_price * 1.01 {
        score += 2;
    }
    if now.last_price > prev.last_price * 1.03 {
        score += 4;
    }
    if now.quote_volume > prev.quote_volume * 1.5 {
        score += 3;
    }
    if now.quote_volume > prev.quote_volume * 2.5 {
        score += 5;
    }
    if now.buy_volume > now.sell_volume * 1.4 {
        score += 3;
    }
    if now.buy_volume > now.sell_volume * 2.0 {
        score += 5;
    }
    if now.last_price < LOWCAP_PRICE {
        score += 2;
    }
    score
}

fn detect_scalper(
    now: &Snapshot,
    prev: Option<&Snapshot>,
    _window: &VecDeque<Snapshot>,
) -> Option<Candidate> {
    let prev = prev?;
    if now.last_price > prev.last_price * 1.008 && now.quote_volume > prev.quote_volume * 1.25 {
        let entry = (now.last_price * 0.999).round();
        return Some(Candidate::new(SignalMode::Scalper, entry, raw_score(now, prev)));
    }
    None
}

fn detect_micro_pump(
    now: &Snapshot,
    prev: Option<&Snapshot>,
    _window: &VecDeque<Snapshot>,
) -> Option<Candidate> {
    let prev = prev?;
    if now.last_price > prev.last_price * 1.035 && now.quote_volume > prev.quote_volume * 1.8 {
        let entry = (now.last_price * 0.995).round();
        return Some(Candidate::new(SignalMode::MicroPump, entry, raw_score(now, prev)));
    }
    None
}

/// Quiet window followed by a +2% break. The window's last element is the
/// current snapshot, so both the deviation bound and the break test compare
/// against the second-to-last entry: the last observation before this one.
fn detect_breakout(
    now: &Snapshot,
    _prev: Option<&Snapshot>,
    window: &VecDeque<Snapshot>,
) -> Option<Candidate> {
    if window.len() < BREAKOUT_MIN_WINDOW {
        return None;
    }

    let prices: Vec<f64> = window.iter().map(|s| s.last_price).collect();
    let dev = pstdev(&prices);
    let base = &window[window.len() - 2];

    if dev < base.last_price * 0.006 && now.last_price > base.last_price * 1.02 {
        let entry = now.last_price.round();
        return Some(Candidate::new(SignalMode::Breakout, entry, raw_score(now, base)));
    }
    None
}

fn detect_accumulation(
    now: &Snapshot,
    prev: Option<&Snapshot>,
    _window: &VecDeque<Snapshot>,
) -> Option<Candidate> {
    let prev = prev?;
    if now.buy_volume > now.sell_volume * 1.7 && now.quote_volume > prev.quote_volume * 1.3 {
        let entry = now.last_price.round();
        return Some(Candidate::new(
            SignalMode::Accumulation,
            entry,
            raw_score(now, prev),
        ));
    }
    None
}

fn detect_rebound(
    now: &Snapshot,
    prev: Option<&Snapshot>,
    _window: &VecDeque<Snapshot>,
) -> Option<Candidate> {
    let prev = prev?;
    if prev.last_price > now.last_price * 1.07 && now.quote_volume > prev.quote_volume * 1.4 {
        let entry = now.last_price.round();
        return Some(Candidate::new(SignalMode::Rebound, entry, raw_score(now, prev)));
    }
    None
}

fn detect_lowcap(
    now: &Snapshot,
    prev: Option<&Snapshot>,
    _window: &VecDeque<Snapshot>,
) -> Option<Candidate> {
    let prev = prev?;
    if now.last_price < LOWCAP_PRICE && now.quote_volume > prev.quote_volume * 3.0 {
        let entry = now.last_price.round();
        return Some(Candidate::new(SignalMode::Lowcap, entry, raw_score(now, prev)));
    }
    None
}

/// Population standard deviation
fn pstdev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot(price: f64, volume: f64) -> Snapshot {
        Snapshot {
            last_price: price,
            quote_volume: volume,
            buy_volume: volume * 0.5,
            sell_volume: volume * 0.5,
            observed_at: Utc::now(),
        }
    }

    fn snapshot_with_flow(price: f64, volume: f64, buy: f64, sell: f64) -> Snapshot {
        Snapshot {
            buy_volume: buy,
            sell_volume: sell,
            ..snapshot(price, volume)
        }
    }

    fn window_of(snapshots: &[Snapshot]) -> VecDeque<Snapshot> {
        snapshots.iter().cloned().collect()
    }

    #[test]
    fn test_scalper_fires_on_price_and_volume_push() {
        let prev = snapshot(1000.0, 1_000_000.0);
        let now = snapshot(1010.0, 1_300_000.0);

        let candidate = detect_scalper(&now, Some(&prev), &window_of(&[])).unwrap();
        assert_eq!(candidate.mode, SignalMode::Scalper);
        assert_eq!(candidate.entry, (1010.0f64 * 0.999).round());
    }

    #[test]
    fn test_scalper_needs_both_conditions() {
        let prev = snapshot(1000.0, 1_000_000.0);
        // Price up, volume flat
        assert!(detect_scalper(&snapshot(1010.0, 1_000_000.0), Some(&prev), &window_of(&[])).is_none());
        // Volume up, price flat
        assert!(detect_scalper(&snapshot(1000.0, 1_300_000.0), Some(&prev), &window_of(&[])).is_none());
    }

    #[test]
    fn test_micro_pump_needs_steeper_push_than_scalper() {
        let prev = snapshot(1000.0, 1_000_000.0);
        let mild = snapshot(1010.0, 1_300_000.0);
        let steep = snapshot(1040.0, 1_900_000.0);

        assert!(detect_micro_pump(&mild, Some(&prev), &window_of(&[])).is_none());
        let candidate = detect_micro_pump(&steep, Some(&prev), &window_of(&[])).unwrap();
        assert_eq!(candidate.mode, SignalMode::MicroPump);
        assert_eq!(candidate.entry, (1040.0f64 * 0.995).round());
    }

    #[test]
    fn test_breakout_fires_after_quiet_window() {
        // Eleven flat observations then a +2.1% break. The break itself is
        // part of the window, so the deviation bound only tolerates it over
        // a long flat run.
        let mut entries: Vec<Snapshot> = (0..11).map(|_| snapshot(1000.0, 2_000_000.0)).collect();
        let now = snapshot(1021.0, 2_000_000.0);
        entries.push(now.clone());

        let candidate = detect_breakout(&now, None, &window_of(&entries)).unwrap();
        assert_eq!(candidate.mode, SignalMode::Breakout);
        assert_eq!(candidate.entry, 1021.0);
    }

    #[test]
    fn test_breakout_requires_min_window() {
        let mut entries: Vec<Snapshot> = (0..8).map(|_| snapshot(1000.0, 2_000_000.0)).collect();
        let now = snapshot(1021.0, 2_000_000.0);
        entries.push(now.clone());

        assert!(detect_breakout(&now, None, &window_of(&entries)).is_none());
    }

    #[test]
    fn test_breakout_suppressed_by_noisy_window() {
        // Same +3% break, but the window has been swinging
        let mut entries = Vec::new();
        for i in 0..9 {
            let price = if i % 2 == 0 { 900.0 } else { 1100.0 };
            entries.push(snapshot(price, 2_000_000.0));
        }
        let now = snapshot(1130.0, 2_000_000.0);
        entries.push(now.clone());

        assert!(detect_breakout(&now, None, &window_of(&entries)).is_none());
    }

    #[test]
    fn test_accumulation_fires_on_buy_skew_with_volume() {
        let prev = snapshot(500.0, 1_000_000.0);
        let now = snapshot_with_flow(500.0, 1_400_000.0, 1_000_000.0, 400_000.0);

        let candidate = detect_accumulation(&now, Some(&prev), &window_of(&[])).unwrap();
        assert_eq!(candidate.mode, SignalMode::Accumulation);
        assert_eq!(candidate.entry, 500.0);
    }

    #[test]
    fn test_accumulation_ignores_balanced_flow() {
        let prev = snapshot(500.0, 1_000_000.0);
        let now = snapshot(500.0, 1_400_000.0);
        assert!(detect_accumulation(&now, Some(&prev), &window_of(&[])).is_none());
    }

    #[test]
    fn test_rebound_fires_after_drop_with_volume() {
        let prev = snapshot(1000.0, 1_000_000.0);
        let now = snapshot(900.0, 1_500_000.0);

        let candidate = detect_rebound(&now, Some(&prev), &window_of(&[])).unwrap();
        assert_eq!(candidate.mode, SignalMode::Rebound);
    }

    #[test]
    fn test_lowcap_needs_low_price_and_volume_burst() {
        let prev = snapshot(150.0, 1_000_000.0);
        let now = snapshot(150.0, 3_100_000.0);

        let candidate = detect_lowcap(&now, Some(&prev), &window_of(&[])).unwrap();
        assert_eq!(candidate.mode, SignalMode::Lowcap);

        let pricey_prev = snapshot(500.0, 1_000_000.0);
        let pricey_now = snapshot(500.0, 3_100_000.0);
        assert!(detect_lowcap(&pricey_now, Some(&pricey_prev), &window_of(&[])).is_none());
    }

    #[test]
    fn test_prev_requiring_modules_skip_first_sighting() {
        let now = snapshot(1010.0, 1_300_000.0);
        let window = window_of(&[now.clone()]);

        assert!(detect_scalper(&now, None, &window).is_none());
        assert!(detect_micro_pump(&now, None, &window).is_none());
        assert!(detect_accumulation(&now, None, &window).is_none());
        assert!(detect_rebound(&now, None, &window).is_none());
        assert!(detect_lowcap(&now, None, &window).is_none());
    }

    #[test]
    fn test_run_all_can_return_several_candidates() {
        let prev = snapshot(100.0, 1_000_000.0);
        // Steep pump with heavy buy skew: scalper, micro_pump and
        // accumulation all fire
        let now = snapshot_with_flow(104.0, 2_000_000.0, 1_500_000.0, 500_000.0);
        let window = window_of(&[prev.clone(), now.clone()]);

        let candidates = run_all(&now, Some(&prev), &window);
        let modes: Vec<SignalMode> = candidates.iter().map(|c| c.mode).collect();
        assert_eq!(
            modes,
            vec![SignalMode::Scalper, SignalMode::MicroPump, SignalMode::Accumulation]
        );
    }

    #[test]
    fn test_raw_score_price_increments() {
        let prev = snapshot(1000.0, 1_000_000.0);
        // Above both price steps, nothing else
        let now = snapshot(1040.0, 1_000_000.0);
        assert_eq!(raw_score(&now, &prev), 2 + 4);
    }

    #[test]
    fn test_raw_score_volume_increments() {
        let prev = snapshot(1000.0, 1_000_000.0);
        let mild = snapshot(1000.0, 1_600_000.0);
        let heavy = snapshot(1000.0, 2_600_000.0);
        assert_eq!(raw_score(&mild, &prev), 3);
        assert_eq!(raw_score(&heavy, &prev), 3 + 5);
    }

    #[test]
    fn test_raw_score_flow_increments() {
        let prev = snapshot(1000.0, 1_000_000.0);
        let skewed = snapshot_with_flow(1000.0, 1_000_000.0, 600_000.0, 400_000.0);
        let heavily_skewed = snapshot_with_flow(1000.0, 1_000_000.0, 850_000.0, 150_000.0);
        assert_eq!(raw_score(&skewed, &prev), 3);
        assert_eq!(raw_score(&heavily_skewed, &prev), 3 + 5);
    }

    #[test]
    fn test_raw_score_lowcap_increment() {
        let prev = snapshot(150.0, 1_000_000.0);
        let now = snapshot(150.0, 1_000_000.0);
        assert_eq!(raw_score(&now, &prev), 2);
    }

    #[test]
    fn test_pstdev_matches_population_formula() {
        assert_eq!(pstdev(&[]), 0.0);
        assert_eq!(pstdev(&[5.0]), 0.0);
        // Population stddev of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 2
        assert_eq!(pstdev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
    }
}
