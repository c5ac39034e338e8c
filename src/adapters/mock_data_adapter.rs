//! Synthetic history provider: a seeded random walk per symbol.
//!
//! The same seed and symbol always yield the same bars, so backtests over
//! mock data are reproducible.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Largest per-bar close-to-close move.
const MAX_STEP: f64 = 0.02;

pub struct MockDataAdapter {
    seed: u64,
    symbols: Vec<String>,
    start: NaiveDateTime,
}

impl MockDataAdapter {
    pub fn new(seed: u64, symbols: Vec<String>) -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            seed,
            symbols,
            start,
        }
    }

    fn symbol_seed(&self, symbol: &str) -> u64 {
        // FNV-1a, stable across builds and platforms.
        symbol
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
                (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
            })
            ^ self.seed
    }
}

impl DataPort for MockDataAdapter {
    fn fetch_history(&self, symbol: &str, lookback: usize) -> Result<Vec<OhlcvBar>, SigtraderError> {
        let mut rng = StdRng::seed_from_u64(self.symbol_seed(symbol));
        let mut close: f64 = rng.gen_range(20.0..200.0);
        let mut bars = Vec::with_capacity(lookback);

        for i in 0..lookback {
            let open = close;
            close = open * (1.0 + rng.gen_range(-MAX_STEP..=MAX_STEP));
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));

            bars.push(OhlcvBar {
                symbol: symbol.to_string(),
                timestamp: self.start + Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: rng.gen_range(1000..=10_000),
            });
        }

        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        Ok(self.symbols.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(seed: u64) -> MockDataAdapter {
        MockDataAdapter::new(seed, vec!["GGAL".into(), "YPFD".into()])
    }

    #[test]
    fn same_seed_same_bars() {
        let a = adapter(42).fetch_history("GGAL", 120).unwrap();
        let b = adapter(42).fetch_history("GGAL", 120).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_symbols_or_seeds_differ() {
        let ggal = adapter(42).fetch_history("GGAL", 30).unwrap();
        let ypfd = adapter(42).fetch_history("YPFD", 30).unwrap();
        let reseeded = adapter(7).fetch_history("GGAL", 30).unwrap();
        assert_ne!(ggal[29].close, ypfd[29].close);
        assert_ne!(ggal[29].close, reseeded[29].close);
    }

    #[test]
    fn walk_stays_within_bounds() {
        let bars = adapter(1).fetch_history("PAMP", 500).unwrap();
        assert_eq!(bars.len(), 500);

        for pair in bars.windows(2) {
            let step = pair[1].close / pair[0].close - 1.0;
            assert!(step.abs() <= MAX_STEP + 1e-12);
            assert!(pair[1].timestamp > pair[0].timestamp);
        }
        for bar in &bars {
            assert!(bar.has_valid_close());
            assert!(bar.low <= bar.open.min(bar.close));
            assert!(bar.high >= bar.open.max(bar.close));
            assert!((1000..=10_000).contains(&bar.volume));
        }
    }

    #[test]
    fn list_symbols_echoes_configuration() {
        assert_eq!(adapter(0).list_symbols().unwrap(), vec!["GGAL", "YPFD"]);
    }
}
