//! Core data types shared across the scanner

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Price level below which an instrument counts as low-priced
pub const LOWCAP_PRICE: f64 = 200.0;

/// Ordered field-name fallbacks for the variant upstream ticker shapes
const PRICE_KEYS: &[&str] = &["last", "last_price", "price"];
const QUOTE_VOLUME_KEYS: &[&str] = &["vol_idr", "vol_quote", "quote_volume"];
const BUY_VOLUME_KEYS: &[&str] = &["vol_buy", "buy_volume"];
const SELL_VOLUME_KEYS: &[&str] = &["vol_sell", "sell_volume"];

/// One normalized observation of an instrument's price/volume state
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub last_price: f64,
    pub quote_volume: f64,
    pub buy_volume: f64,
    pub sell_volume: f64,
    pub observed_at: DateTime<Utc>,
}

impl Snapshot {
    /// Normalize a raw ticker record. Returns `None` when the record lacks a
    /// usable price or quote volume, or when any field is non-finite or
    /// negative. Buy/sell volume default to half of quote volume when absent.
    pub fn from_raw(raw: &Value, observed_at: DateTime<Utc>) -> Option<Snapshot> {
        let last_price = pick_num(raw, PRICE_KEYS)?;
        let quote_volume = pick_num(raw, QUOTE_VOLUME_KEYS)?;
        let buy_volume = pick_num(raw, BUY_VOLUME_KEYS).unwrap_or(quote_volume * 0.5);
        let sell_volume = pick_num(raw, SELL_VOLUME_KEYS).unwrap_or(quote_volume * 0.5);

        let snapshot = Snapshot {
            last_price,
            quote_volume,
            buy_volume,
            sell_volume,
            observed_at,
        };

        let fields = [last_price, quote_volume, buy_volume, sell_volume];
        if fields.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return None;
        }

        Some(snapshot)
    }
}

/// Detection mode. Declaration order matches the detector evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalMode {
    Scalper,
    MicroPump,
    Breakout,
    Accumulation,
    Rebound,
    Lowcap,
}

impl SignalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalMode::Scalper => "scalper",
            SignalMode::MicroPump => "micro_pump",
            SignalMode::Breakout => "breakout",
            SignalMode::Accumulation => "accumulation",
            SignalMode::Rebound => "rebound",
            SignalMode::Lowcap => "lowcap",
        }
    }

    /// Take-profit / stop-loss multiplier set for this mode
    fn level_multipliers(self) -> (f64, f64) {
        match self {
            SignalMode::Scalper => (1.035, 0.992),
            SignalMode::Accumulation | SignalMode::Lowcap => (1.10, 0.987),
            SignalMode::MicroPump | SignalMode::Breakout | SignalMode::Rebound => (1.06, 0.99),
        }
    }
}

impl std::fmt::Display for SignalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive take-profit and stop-loss levels for an entry price.
/// Deterministic: identical (entry, mode) always yields identical levels.
pub fn calc_levels(entry: f64, mode: SignalMode) -> (f64, f64) {
    let (tp_mult, sl_mult) = mode.level_multipliers();
    (round_dp(entry * tp_mult, 6), round_dp(entry * sl_mult, 6))
}

/// A detection module's proposed signal, not yet scored against the book
#[derive(Debug, Clone)]
pub struct Candidate {
    pub mode: SignalMode,
    pub entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub raw_score: u32,
}

impl Candidate {
    pub fn new(mode: SignalMode, entry: f64, raw_score: u32) -> Self {
        let (take_profit, stop_loss) = calc_levels(entry, mode);
        Self {
            mode,
            entry,
            take_profit,
            stop_loss,
            raw_score,
        }
    }

    /// Composite priority: raw score plus the imbalance magnitude term,
    /// plus a fixed boost when news is flagged for the instrument.
    pub fn priority(&self, imbalance: f64, news: bool) -> f64 {
        let mut priority = self.raw_score as f64 + imbalance.abs() * 0.15;
        if news {
            priority += 8.0;
        }
        priority
    }
}

/// A dispatched alert as exposed by the signals API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSignal {
    pub id: Uuid,
    pub mode: SignalMode,
    pub pair: String,
    pub time: DateTime<Utc>,
    pub entry: f64,
    #[serde(rename = "tp")]
    pub take_profit: f64,
    #[serde(rename = "sl")]
    pub stop_loss: f64,
    pub priority: f64,
    pub imbalance: f64,
    pub news: bool,
}

/// Accept JSON numbers and numeric strings; upstream mixes both.
pub(crate) fn json_num(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn pick_num(raw: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| raw.get(key).and_then(json_num))
}

/// Round to a fixed number of decimal places
pub(crate) fn round_dp(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
