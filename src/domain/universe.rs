//! Symbol universe: parsing the configured symbol list and loading each
//! symbol's history, skipping the ones the provider cannot serve.

use crate::domain::error::SigtraderError;
use crate::domain::symbol_data::SymbolData;
use crate::ports::data_port::DataPort;
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Splits a comma-separated list into upper-case symbols.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    FetchFailed(String),
    NoData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug)]
pub struct LoadedUniverse {
    pub symbols: Vec<SymbolData>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Fetches up to `lookback` bars per symbol. Symbols shorter than `minimum`
/// are kept (they simply never trade) but logged. Fails only when no symbol
/// returned any data.
pub fn load_universe(
    data_port: &dyn DataPort,
    symbols: &[String],
    lookback: usize,
    minimum: usize,
) -> Result<LoadedUniverse, SigtraderError> {
    let mut loaded = Vec::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        let bars = match data_port.fetch_history(symbol, lookback) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: SkipReason::FetchFailed(e.to_string()),
                });
                continue;
            }
        };

        let bars: Vec<_> = bars.into_iter().filter(|b| b.has_valid_close()).collect();
        if bars.is_empty() {
            warn!(symbol = %symbol, "skipping symbol with no usable bars");
            skipped.push(SkippedSymbol {
                symbol: symbol.clone(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        if bars.len() < minimum {
            warn!(
                symbol = %symbol,
                bars = bars.len(),
                minimum,
                "history shorter than indicator warmup, symbol will only hold"
            );
        }

        let fetched = bars.len();
        let data = SymbolData::new(symbol.clone(), bars);
        if data.bar_count() < fetched {
            warn!(
                symbol = %symbol,
                dropped = fetched - data.bar_count(),
                "dropped bars with repeated timestamps"
            );
        }

        info!(symbol = %symbol, bars = data.bar_count(), "loaded history");
        loaded.push(data);
    }

    if loaded.is_empty() {
        return Err(SigtraderError::NoData {
            symbol: symbols.join(","),
        });
    }

    Ok(LoadedUniverse {
        symbols: loaded,
        skipped,
    })
}
