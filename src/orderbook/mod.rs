//! Order book imbalance probe
//!
//! Computes the signed skew between aggregated buy and sell quantities over
//! the top levels of the book. Positive means buy pressure.

use crate::types::{json_num, round_dp};
use serde::Deserialize;
use serde_json::Value;

/// Price levels summed per side
const DEPTH_LEVELS: usize = 8;

/// Raw depth response: two arrays of `[price, quantity]` rows. Rows are kept
/// as loose JSON because upstream mixes numbers and numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Depth {
    #[serde(default)]
    pub buy: Vec<Vec<Value>>,
    #[serde(default)]
    pub sell: Vec<Vec<Value>>,
}

impl Depth {
    /// Signed imbalance percentage over the top levels, rounded to one
    /// decimal. 0.0 when both sides are empty.
    pub fn imbalance_pct(&self) -> f64 {
        let buy = side_quantity(&self.buy);
        let sell = side_quantity(&self.sell);

        if buy + sell == 0.0 {
            return 0.0;
        }

        let imbalance = (buy - sell) / (buy + sell);
        round_dp(imbalance * 100.0, 1)
    }
}

fn side_quantity(levels: &[Vec<Value>]) -> f64 {
    levels
        .iter()
        .take(DEPTH_LEVELS)
        .filter_map(|level| level.get(1).and_then(json_num))
        .sum()
}
