//! Per-symbol bar storage and the unified multi-symbol timeline.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct SymbolData {
    pub symbol: String,
    pub bars: Vec<OhlcvBar>,
    pub timestamp_index: HashMap<NaiveDateTime, usize>,
}

impl SymbolData {
    /// Orders bars by timestamp, keeps the first bar of any repeated
    /// timestamp and tags every bar with `symbol`.
    pub fn new(symbol: String, mut bars: Vec<OhlcvBar>) -> Self {
        bars.sort_by_key(|bar| bar.timestamp);
        bars.dedup_by_key(|bar| bar.timestamp);
        for bar in bars.iter_mut().filter(|bar| bar.symbol != symbol) {
            bar.symbol.clone_from(&symbol);
        }

        let timestamp_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.timestamp, i))
            .collect();
        Self {
            symbol,
            bars,
            timestamp_index,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn get_bar(&self, timestamp: NaiveDateTime) -> Option<&OhlcvBar> {
        self.timestamp_index.get(&timestamp).map(|&i| &self.bars[i])
    }

    pub fn get_bar_index(&self, timestamp: NaiveDateTime) -> Option<usize> {
        self.timestamp_index.get(&timestamp).copied()
    }

    /// Bars `0..=index`: everything known at that bar.
    pub fn history_through(&self, index: usize) -> &[OhlcvBar] {
        let end = (index + 1).min(self.bars.len());
        &self.bars[..end]
    }
}

/// Sorted union of every symbol's timestamps.
pub fn build_unified_timeline(symbols: &[SymbolData]) -> Vec<NaiveDateTime> {
    let unique: BTreeSet<NaiveDateTime> = symbols
        .iter()
        .flat_map(|sd| sd.bars.iter().map(|bar| bar.timestamp))
        .collect();
    unique.into_iter().collect()
}
