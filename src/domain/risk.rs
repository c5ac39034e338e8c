//! Volatility-based position sizing.
//!
//! quantity = floor(equity * risk_fraction / (stop_atr_multiple * ATR)),
//! capped at floor(equity * max_allocation / price), never below 1.

use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    pub risk_fraction: f64,
    pub max_allocation: f64,
    pub stop_atr_multiple: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            risk_fraction: 0.02,
            max_allocation: 0.20,
            stop_atr_multiple: 2.0,
        }
    }
}

/// Quantity returned when inputs cannot be sized.
pub const FALLBACK_QUANTITY: u64 = 1;

#[derive(Debug, Clone, Default)]
pub struct RiskSizer {
    config: RiskConfig,
}

impl RiskSizer {
    pub fn new(config: RiskConfig) -> Self {
        RiskSizer { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn stop_distance(&self, volatility: f64) -> f64 {
        self.config.stop_atr_multiple * volatility
    }

    /// Protective stop below `price`, floored at 0.
    pub fn stop_price(&self, price: f64, volatility: f64) -> f64 {
        (price - self.stop_distance(volatility)).max(0.0)
    }

    pub fn size(&self, symbol: &str, price: f64, volatility: f64, equity: f64) -> u64 {
        let degenerate = !price.is_finite()
            || !volatility.is_finite()
            || !equity.is_finite()
            || price <= 0.0
            || volatility <= 0.0
            || equity <= 0.0;
        if degenerate {
            warn!(
                symbol,
                price, volatility, equity, "degenerate sizing input, using fallback quantity"
            );
            return FALLBACK_QUANTITY;
        }

        let risk_budget = equity * self.config.risk_fraction;
        let stop_distance = self.stop_distance(volatility);
        let raw_qty = if stop_distance > 0.0 {
            (risk_budget / stop_distance).floor() as u64
        } else {
            FALLBACK_QUANTITY
        };
        let max_qty = (equity * self.config.max_allocation / price).floor() as u64;
        let quantity = raw_qty.min(max_qty).max(FALLBACK_QUANTITY);

        debug!(
            symbol,
            volatility, risk_budget, raw_qty, max_qty, quantity, "position sized"
        );
        quantity
    }
}
