//! Simulated account ledger: cash, holdings, trades and the equity curve.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use super::position::{Position, TradeRecord};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

/// Invariant: `equity = cash + Σ quantity × last_price`, `cash >= 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub cash: f64,
    pub initial_capital: f64,
    pub positions: BTreeMap<String, Position>,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    /// Latest close seen per symbol, used for mark-to-market.
    pub last_prices: BTreeMap<String, f64>,
}

impl Ledger {
    pub fn new(initial_capital: f64) -> Self {
        Ledger {
            cash: initial_capital,
            initial_capital,
            positions: BTreeMap::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            last_prices: BTreeMap::new(),
        }
    }

    pub fn add_position(&mut self, position: Position) {
        self.positions.insert(position.symbol.clone(), position);
    }

    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn remove_position(&mut self, symbol: &str) -> Option<Position> {
        self.positions.remove(symbol)
    }

    /// Shares held, 0 when flat.
    pub fn position_quantity(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).map_or(0, |p| p.quantity)
    }

    pub fn mark(&mut self, symbol: &str, price: f64) {
        self.last_prices.insert(symbol.to_string(), price);
    }

    pub fn record_trade(&mut self, trade: TradeRecord) {
        self.trades.push(trade);
    }

    /// Cash plus every holding at its own last seen price (entry price if the
    /// symbol was never marked).
    pub fn total_equity(&self) -> f64 {
        let holdings: f64 = self
            .positions
            .values()
            .map(|pos| {
                let price = self
                    .last_prices
                    .get(&pos.symbol)
                    .copied()
                    .unwrap_or(pos.entry_price);
                pos.market_value(price)
            })
            .sum();
        self.cash + holdings
    }

    /// Appends a snapshot of the current total equity and returns it.
    pub fn record_equity(&mut self, timestamp: NaiveDateTime) -> f64 {
        let equity = self.total_equity();
        self.equity_curve.push(EquityPoint { timestamp, equity });
        equity
    }
}
