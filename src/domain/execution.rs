//! Order settlement against the simulated ledger.
//!
//! Entries are long-only, whole shares, at the bar close. An entry is
//! rejected outright (never partially filled) when the quantity is zero or
//! the cost exceeds available cash. Exits liquidate the whole position.

use chrono::NaiveDateTime;
use std::fmt;

use super::portfolio::Ledger;
use super::position::{Position, Side, TradeRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizingMode {
    /// `floor(cash × allocation_fraction / price)` shares.
    #[default]
    FixedFraction,
    /// Quantity from the risk sizer.
    RiskBased,
}

impl SizingMode {
    pub fn from_name(name: &str) -> Option<SizingMode> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fixed" => Some(SizingMode::FixedFraction),
            "risk" => Some(SizingMode::RiskBased),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub allocation_fraction: f64,
    pub sizing: SizingMode,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            allocation_fraction: 0.10,
            sizing: SizingMode::FixedFraction,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    ZeroQuantity,
    InsufficientCash { cost: f64, cash: f64 },
    AlreadyHolding,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::ZeroQuantity => f.write_str("quantity rounds to zero"),
            RejectReason::InsufficientCash { cost, cash } => {
                write!(f, "cost {:.2} exceeds cash {:.2}", cost, cash)
            }
            RejectReason::AlreadyHolding => f.write_str("position already open"),
        }
    }
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered { quantity: u64, price: f64, cost: f64 },
    Rejected(RejectReason),
}

/// Result of an exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub quantity: u64,
    pub price: f64,
    pub proceeds: f64,
    pub pnl: f64,
}

/// Shares to buy under `config`. `sized_quantity` is the risk sizer's
/// answer and is only used in [`SizingMode::RiskBased`].
pub fn entry_quantity(cash: f64, price: f64, sized_quantity: u64, config: &ExecutionConfig) -> u64 {
    if !price.is_finite() || price <= 0.0 || !cash.is_finite() || cash <= 0.0 {
        return 0;
    }
    match config.sizing {
        SizingMode::FixedFraction => (cash * config.allocation_fraction / price).floor() as u64,
        SizingMode::RiskBased => sized_quantity,
    }
}

/// Open a long position of `quantity` shares at `price`.
pub fn enter_long(
    ledger: &mut Ledger,
    symbol: &str,
    price: f64,
    quantity: u64,
    timestamp: NaiveDateTime,
) -> EntryResult {
    if ledger.position_quantity(symbol) != 0 {
        return EntryResult::Rejected(RejectReason::AlreadyHolding);
    }
    if quantity == 0 {
        return EntryResult::Rejected(RejectReason::ZeroQuantity);
    }

    let cost = quantity as f64 * price;
    if !cost.is_finite() || cost > ledger.cash {
        return EntryResult::Rejected(RejectReason::InsufficientCash {
            cost,
            cash: ledger.cash,
        });
    }

    ledger.cash -= cost;
    ledger.add_position(Position {
        symbol: symbol.to_string(),
        quantity: quantity as i64,
        entry_price: price,
        entry_timestamp: timestamp,
    });
    ledger.record_trade(TradeRecord {
        timestamp,
        symbol: symbol.to_string(),
        side: Side::Buy,
        quantity,
        price,
        cash_after: ledger.cash,
    });

    EntryResult::Entered {
        quantity,
        price,
        cost,
    }
}

/// Liquidate the whole position in `symbol` at `price`. `None` when flat.
pub fn exit_position(
    ledger: &mut Ledger,
    symbol: &str,
    price: f64,
    timestamp: NaiveDateTime,
) -> Option<ExitResult> {
    let position = ledger.remove_position(symbol)?;
    let quantity = position.quantity.unsigned_abs();
    let proceeds = quantity as f64 * price;
    let pnl = position.unrealized_pnl(price);

    ledger.cash += proceeds;
    ledger.record_trade(TradeRecord {
        timestamp,
        symbol: symbol.to_string(),
        side: Side::Sell,
        quantity,
        price,
        cash_after: ledger.cash,
    });

    Some(ExitResult {
        quantity,
        price,
        proceeds,
        pnl,
    })
}
