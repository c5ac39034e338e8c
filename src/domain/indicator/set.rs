//! Indicator parameters and the per-bar indicator snapshot consumed by the
//! strategy.

use crate::domain::indicator::{
    atr, bollinger, calculate_atr, calculate_bollinger, calculate_macd, calculate_rsi, macd,
    IndicatorSeries, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_MIN_HISTORY: usize = 50;

/// Lookbacks for every indicator the strategy reads.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
    pub bollinger_period: usize,
    pub bollinger_mult: f64,
    pub min_history: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            rsi_period: DEFAULT_RSI_PERIOD,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            atr_period: atr::DEFAULT_PERIOD,
            bollinger_period: bollinger::DEFAULT_PERIOD,
            bollinger_mult: bollinger::DEFAULT_MULTIPLIER,
            min_history: DEFAULT_MIN_HISTORY,
        }
    }
}

impl IndicatorParams {
    pub fn largest_lookback(&self) -> usize {
        [
            self.rsi_period,
            self.macd_fast,
            self.macd_slow,
            self.macd_signal,
            self.atr_period,
            self.bollinger_period,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Bars needed before any indicator snapshot is considered valid.
    ///
    /// Never below the largest lookback + 1, nor below the MACD signal
    /// warmup, so the latest snapshot is always fully defined.
    pub fn required_minimum(&self) -> usize {
        let macd_warmup = self.macd_fast.max(self.macd_slow) + self.macd_signal - 1;
        self.min_history
            .max(self.largest_lookback() + 1)
            .max(macd_warmup)
    }
}

/// Indicator values at one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndicatorSet {
    pub rsi: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub atr: f64,
    pub band_middle: f64,
    pub band_upper: f64,
    pub band_lower: f64,
}

impl IndicatorSet {
    /// Snapshot at the most recent bar, or `None` if the history is shorter
    /// than `params.required_minimum()`.
    pub fn latest(bars: &[OhlcvBar], params: &IndicatorParams) -> Option<IndicatorSet> {
        IndicatorPair::compute(bars, params).map(|pair| pair.current)
    }

    /// Copy rounded for display: 2 dp for RSI, ATR and bands; 4 dp for MACD.
    pub fn rounded(&self) -> IndicatorSet {
        IndicatorSet {
            rsi: round_to(self.rsi, 2),
            macd_line: round_to(self.macd_line, 4),
            macd_signal: round_to(self.macd_signal, 4),
            atr: round_to(self.atr, 2),
            band_middle: round_to(self.band_middle, 2),
            band_upper: round_to(self.band_upper, 2),
            band_lower: round_to(self.band_lower, 2),
        }
    }
}

/// Snapshots at the latest bar and the bar before it, used for crossover
/// detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPair {
    pub current: IndicatorSet,
    pub previous: Option<IndicatorSet>,
}

impl IndicatorPair {
    pub fn compute(bars: &[OhlcvBar], params: &IndicatorParams) -> Option<IndicatorPair> {
        if bars.is_empty() || bars.len() < params.required_minimum() {
            return None;
        }

        let series = SeriesBundle {
            rsi: calculate_rsi(bars, params.rsi_period),
            macd: calculate_macd(bars, params.macd_fast, params.macd_slow, params.macd_signal),
            atr: calculate_atr(bars, params.atr_period),
            bollinger: calculate_bollinger(bars, params.bollinger_period, params.bollinger_mult),
        };

        let last = bars.len() - 1;
        let current = series.at(last)?;
        let previous = last.checked_sub(1).and_then(|i| series.at(i));
        Some(IndicatorPair { current, previous })
    }
}

struct SeriesBundle {
    rsi: IndicatorSeries,
    macd: IndicatorSeries,
    atr: IndicatorSeries,
    bollinger: IndicatorSeries,
}

impl SeriesBundle {
    fn at(&self, index: usize) -> Option<IndicatorSet> {
        let rsi = self.rsi.simple_at(index)?;
        let (macd_line, macd_signal) = match self.macd.valid_at(index)? {
            IndicatorValue::Macd { line, signal, .. } => (*line, *signal),
            _ => return None,
        };
        let (band_upper, band_middle, band_lower) = match self.bollinger.valid_at(index)? {
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => (*upper, *middle, *lower),
            _ => return None,
        };
        // ATR reads 0 until it has period + 1 bars.
        let atr = self.atr.simple_at(index).unwrap_or(0.0);

        Some(IndicatorSet {
            rsi,
            macd_line,
            macd_signal,
            atr,
            band_middle,
            band_upper,
            band_lower,
        })
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
