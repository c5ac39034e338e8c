//! Market history provider port.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;

pub trait DataPort {
    /// Up to `lookback` most recent bars for `symbol`, oldest first.
    fn fetch_history(&self, symbol: &str, lookback: usize) -> Result<Vec<OhlcvBar>, SigtraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError>;
}
