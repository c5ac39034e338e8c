//! Live decision cycle: analyze, size, explain and place at most one order
//! per symbol through an [`OrderExecutor`].
//!
//! Positions only change after the executor accepts an order.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::domain::backtest::Oracles;
use crate::domain::narrator::{Decision, Narrator};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::Side;
use crate::domain::risk::RiskSizer;
use crate::domain::strategy::{Analysis, Strategy};
use crate::ports::executor_port::OrderExecutor;

#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    NoAction,
    /// Buy signal while already long, or sell signal while flat.
    Ignored,
    Filled { side: Side, quantity: u64, price: f64 },
    Failed { side: Side, reason: String },
}

#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub analysis: Analysis,
    pub narrative: String,
    pub sized_quantity: u64,
    pub order: OrderOutcome,
}

pub struct LiveTrader<'a> {
    strategy: &'a Strategy,
    sizer: &'a RiskSizer,
    narrator: &'a Narrator,
    oracles: Oracles<'a>,
    executor: &'a mut dyn OrderExecutor,
    account_equity: f64,
    positions: BTreeMap<String, i64>,
}

impl<'a> LiveTrader<'a> {
    pub fn new(
        strategy: &'a Strategy,
        sizer: &'a RiskSizer,
        narrator: &'a Narrator,
        oracles: Oracles<'a>,
        executor: &'a mut dyn OrderExecutor,
        account_equity: f64,
    ) -> Self {
        LiveTrader {
            strategy,
            sizer,
            narrator,
            oracles,
            executor,
            account_equity,
            positions: BTreeMap::new(),
        }
    }

    pub fn with_positions(mut self, positions: BTreeMap<String, i64>) -> Self {
        self.positions = positions;
        self
    }

    pub fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn positions(&self) -> &BTreeMap<String, i64> {
        &self.positions
    }

    pub fn process_cycle(&mut self, symbol: &str, history: &[OhlcvBar]) -> CycleOutcome {
        let position = self.position(symbol);
        let sentiment = self.oracles.sentiment.sentiment(symbol, history);
        let policy = self.oracles.policy.action(symbol, history, position);
        let analysis = self
            .strategy
            .analyze(symbol, history, sentiment, policy, position);
        let narrative = self.narrator.explain(&Decision::from_analysis(&analysis));
        info!(symbol, signal = %analysis.signal, "{}", narrative);

        let sized_quantity =
            self.sizer
                .size(symbol, analysis.price, analysis.volatility, self.account_equity);

        let order = if analysis.signal.is_buy() {
            if position == 0 {
                self.execute(symbol, Side::Buy, sized_quantity, analysis.price)
            } else {
                info!(symbol, position, "buy signal ignored, already holding");
                OrderOutcome::Ignored
            }
        } else if analysis.signal.is_sell() {
            if position > 0 {
                self.execute(symbol, Side::Sell, position.unsigned_abs(), analysis.price)
            } else {
                info!(symbol, "sell signal ignored, no position");
                OrderOutcome::Ignored
            }
        } else {
            OrderOutcome::NoAction
        };

        CycleOutcome {
            analysis,
            narrative,
            sized_quantity,
            order,
        }
    }

    fn execute(&mut self, symbol: &str, side: Side, quantity: u64, price: f64) -> OrderOutcome {
        match self.executor.place_order(symbol, side, quantity, price) {
            Ok(()) => {
                let entry = self.positions.entry(symbol.to_string()).or_insert(0);
                match side {
                    Side::Buy => *entry += quantity as i64,
                    Side::Sell => *entry -= quantity as i64,
                }
                info!(symbol, side = %side, quantity, price, "order filled");
                OrderOutcome::Filled {
                    side,
                    quantity,
                    price,
                }
            }
            Err(e) => {
                warn!(symbol, side = %side, error = %e, "order failed, position unchanged");
                OrderOutcome::Failed {
                    side,
                    reason: e.to_string(),
                }
            }
        }
    }
}
