//! Performance report computed from a finished backtest.

use std::collections::BTreeMap;

use super::backtest::BacktestResult;
use super::portfolio::EquityPoint;
use super::position::{pair_round_trips, RoundTrip};

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub initial_capital: f64,
    pub final_equity: f64,
    pub total_return: f64,
    /// Largest peak-to-trough decline as a non-positive fraction.
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub round_trips: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub evaluated_bars: usize,
    pub rejected_orders: usize,
    pub per_symbol: Vec<SymbolSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSummary {
    pub symbol: String,
    pub trades: usize,
    pub round_trips: usize,
    pub win_rate: f64,
    pub realized_pnl: f64,
}

impl Report {
    pub fn compute(result: &BacktestResult) -> Self {
        let ledger = &result.ledger;
        let initial_capital = ledger.initial_capital;

        let final_equity = ledger
            .equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital
        } else {
            0.0
        };

        let trips = pair_round_trips(&ledger.trades);
        let stats = TripStats::from_trips(&trips);

        Report {
            initial_capital,
            final_equity,
            total_return,
            max_drawdown: compute_drawdown(&ledger.equity_curve),
            total_trades: ledger.trades.len(),
            round_trips: trips.len(),
            trades_won: stats.won,
            trades_lost: stats.lost,
            win_rate: stats.win_rate(),
            profit_factor: stats.profit_factor(),
            evaluated_bars: result.evaluated_bars,
            rejected_orders: result.rejected_orders,
            per_symbol: SymbolSummary::compute(result, &trips),
        }
    }
}

impl SymbolSummary {
    fn compute(result: &BacktestResult, trips: &[RoundTrip]) -> Vec<SymbolSummary> {
        let mut trade_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for trade in &result.ledger.trades {
            *trade_counts.entry(trade.symbol.as_str()).or_default() += 1;
        }

        trade_counts
            .into_iter()
            .map(|(symbol, trades)| {
                let own: Vec<RoundTrip> = trips
                    .iter()
                    .filter(|t| t.symbol == symbol)
                    .cloned()
                    .collect();
                let stats = TripStats::from_trips(&own);
                SymbolSummary {
                    symbol: symbol.to_string(),
                    trades,
                    round_trips: own.len(),
                    win_rate: stats.win_rate(),
                    realized_pnl: stats.gross_wins - stats.gross_losses,
                }
            })
            .collect()
    }
}

#[derive(Default)]
struct TripStats {
    won: usize,
    lost: usize,
    total: usize,
    gross_wins: f64,
    gross_losses: f64,
}

impl TripStats {
    fn from_trips(trips: &[RoundTrip]) -> Self {
        let mut stats = TripStats {
            total: trips.len(),
            ..TripStats::default()
        };
        for trip in trips {
            if trip.pnl > 0.0 {
                stats.won += 1;
                stats.gross_wins += trip.pnl;
            } else if trip.pnl < 0.0 {
                stats.lost += 1;
                stats.gross_losses += trip.pnl.abs();
            }
        }
        stats
    }

    fn win_rate(&self) -> f64 {
        if self.total > 0 {
            self.won as f64 / self.total as f64
        } else {
            0.0
        }
    }

    fn profit_factor(&self) -> f64 {
        if self.gross_losses > 0.0 {
            self.gross_wins / self.gross_losses
        } else if self.gross_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }
}

/// `min_t (equity_t - running_max_t) / running_max_t`; 0 for an empty or
/// non-decreasing curve.
pub fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            let dd = (point.equity - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
