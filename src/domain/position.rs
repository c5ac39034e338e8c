//! Open positions, executed trades and derived round trips.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

/// Long holding in one symbol. Flat symbols have no `Position`.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: i64,
    pub entry_price: f64,
    pub entry_timestamp: NaiveDateTime,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.quantity > 0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity as f64 * (price - self.entry_price)
    }
}

/// One executed order. Quantity and price are always positive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TradeRecord {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub price: f64,
    pub cash_after: f64,
}

impl TradeRecord {
    pub fn value(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}

/// A buy paired with the sell that closed it.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip {
    pub symbol: String,
    pub quantity: u64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_timestamp: NaiveDateTime,
    pub exit_timestamp: NaiveDateTime,
    pub pnl: f64,
}

impl RoundTrip {
    pub fn return_pct(&self) -> f64 {
        if self.entry_price > 0.0 {
            (self.exit_price - self.entry_price) / self.entry_price
        } else {
            0.0
        }
    }
}

/// Pairs each sell with the open buy of the same symbol. Buys still open at
/// the end are not returned.
pub fn pair_round_trips(trades: &[TradeRecord]) -> Vec<RoundTrip> {
    let mut open: HashMap<&str, &TradeRecord> = HashMap::new();
    let mut trips = Vec::new();

    for trade in trades {
        match trade.side {
            Side::Buy => {
                open.insert(trade.symbol.as_str(), trade);
            }
            Side::Sell => {
                if let Some(entry) = open.remove(trade.symbol.as_str()) {
                    trips.push(RoundTrip {
                        symbol: trade.symbol.clone(),
                        quantity: trade.quantity,
                        entry_price: entry.price,
                        exit_price: trade.price,
                        entry_timestamp: entry.timestamp,
                        exit_timestamp: trade.timestamp,
                        pnl: trade.quantity as f64 * (trade.price - entry.price),
                    });
                }
            }
        }
    }

    trips
}
