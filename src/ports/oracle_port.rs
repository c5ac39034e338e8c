//! Opaque scoring collaborators consulted once per decision.
//!
//! Returning `None` means the oracle has no opinion; the strategy then uses
//! a neutral sentiment of 0.0 and a Hold policy action.

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::strategy::PolicyAction;

pub trait SentimentOracle {
    /// Score in [-1, 1] for the last bar of `history`.
    fn sentiment(&self, symbol: &str, history: &[OhlcvBar]) -> Option<f64>;
}

pub trait PolicyOracle {
    fn action(&self, symbol: &str, history: &[OhlcvBar], position: i64) -> Option<PolicyAction>;
}
