//! Event-driven backtest simulator.
//!
//! Bars are replayed in timestamp order across every symbol. Each bar goes
//! through AwaitingBar → Evaluating → Settling, and the run ends in Done.
//! Cash is shared; each symbol is marked at its own latest close and one
//! equity snapshot is taken per timestamp after every symbol has settled.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::domain::execution::{
    enter_long, entry_quantity, exit_position, EntryResult, ExecutionConfig, RejectReason,
};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::portfolio::Ledger;
use crate::domain::risk::RiskSizer;
use crate::domain::strategy::{Signal, Strategy};
use crate::domain::symbol_data::{build_unified_timeline, SymbolData};
use crate::ports::oracle_port::{PolicyOracle, SentimentOracle};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub execution: ExecutionConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            execution: ExecutionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    AwaitingBar,
    Evaluating,
    Settling,
    Done,
}

/// What settlement did with a bar's signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Bought { quantity: u64 },
    Sold { quantity: u64 },
    Rejected(RejectReason),
}

/// Audit record for one evaluated bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarDecision {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub signal: Signal,
    pub reason: String,
    pub price: f64,
    /// Risk sizer quantity at this bar; used for entries only in risk mode.
    pub sized_quantity: u64,
    pub action: Action,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub ledger: Ledger,
    pub decisions: Vec<BarDecision>,
    pub evaluated_bars: usize,
    pub rejected_orders: usize,
}

/// Sentiment and policy collaborators for a run.
#[derive(Clone, Copy)]
pub struct Oracles<'a> {
    pub sentiment: &'a dyn SentimentOracle,
    pub policy: &'a dyn PolicyOracle,
}

pub struct Backtester<'a> {
    strategy: &'a Strategy,
    sizer: &'a RiskSizer,
    oracles: Oracles<'a>,
    config: &'a BacktestConfig,
    state: SimState,
}

impl<'a> Backtester<'a> {
    pub fn new(
        strategy: &'a Strategy,
        sizer: &'a RiskSizer,
        oracles: Oracles<'a>,
        config: &'a BacktestConfig,
    ) -> Self {
        Backtester {
            strategy,
            sizer,
            oracles,
            config,
            state: SimState::AwaitingBar,
        }
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    /// Replays a single symbol's bars.
    pub fn run_single(&mut self, symbol: &str, bars: Vec<OhlcvBar>) -> BacktestResult {
        self.run(&[SymbolData::new(symbol.to_string(), bars)])
    }

    pub fn run(&mut self, symbols: &[SymbolData]) -> BacktestResult {
        let timeline = build_unified_timeline(symbols);
        let minimum = self.strategy.required_minimum();
        let mut ledger = Ledger::new(self.config.initial_capital);
        let mut decisions = Vec::new();
        let mut evaluated_bars = 0usize;
        let mut rejected_orders = 0usize;
        let mut started = false;

        for &timestamp in &timeline {
            self.state = SimState::AwaitingBar;

            for sd in symbols {
                let Some(index) = sd.get_bar_index(timestamp) else {
                    continue;
                };
                let bar = &sd.bars[index];
                ledger.mark(&sd.symbol, bar.close);

                // The first decision sees one bar past the warmup window.
                if index < minimum {
                    continue;
                }
                started = true;
                evaluated_bars += 1;

                let decision = self.step(&mut ledger, sd, index);
                if matches!(decision.action, Action::Rejected(_)) {
                    rejected_orders += 1;
                }
                decisions.push(decision);
                self.state = SimState::AwaitingBar;
            }

            if started {
                ledger.record_equity(timestamp);
            }
        }

        self.state = SimState::Done;
        info!(
            symbols = symbols.len(),
            bars = timeline.len(),
            evaluated_bars,
            trades = ledger.trades.len(),
            rejected_orders,
            final_equity = ledger.total_equity(),
            "backtest complete"
        );

        BacktestResult {
            ledger,
            decisions,
            evaluated_bars,
            rejected_orders,
        }
    }

    fn step(&mut self, ledger: &mut Ledger, sd: &SymbolData, index: usize) -> BarDecision {
        self.state = SimState::Evaluating;
        let bar = &sd.bars[index];
        let history = sd.history_through(index);
        let position = ledger.position_quantity(&sd.symbol);

        let sentiment = self.oracles.sentiment.sentiment(&sd.symbol, history);
        let policy = self.oracles.policy.action(&sd.symbol, history, position);
        let analysis = self
            .strategy
            .analyze(&sd.symbol, history, sentiment, policy, position);
        let sized_quantity = self.sizer.size(
            &sd.symbol,
            bar.close,
            analysis.volatility,
            ledger.total_equity(),
        );

        self.state = SimState::Settling;
        let action = self.settle(ledger, &sd.symbol, bar, analysis.signal, position, sized_quantity);

        BarDecision {
            timestamp: bar.timestamp,
            symbol: sd.symbol.clone(),
            signal: analysis.signal,
            reason: analysis.reason,
            price: bar.close,
            sized_quantity,
            action,
        }
    }

    fn settle(
        &self,
        ledger: &mut Ledger,
        symbol: &str,
        bar: &OhlcvBar,
        signal: Signal,
        position: i64,
        sized_quantity: u64,
    ) -> Action {
        if signal.is_buy() && position == 0 {
            let quantity = entry_quantity(
                ledger.cash,
                bar.close,
                sized_quantity,
                &self.config.execution,
            );
            match enter_long(ledger, symbol, bar.close, quantity, bar.timestamp) {
                EntryResult::Entered { quantity, cost, .. } => {
                    info!(
                        symbol = %symbol,
                        timestamp = %bar.timestamp,
                        quantity,
                        price = bar.close,
                        cost,
                        "BUY"
                    );
                    Action::Bought { quantity }
                }
                EntryResult::Rejected(reason) => {
                    debug!(
                        symbol = %symbol,
                        timestamp = %bar.timestamp,
                        reason = %reason,
                        "entry rejected"
                    );
                    Action::Rejected(reason)
                }
            }
        } else if signal.is_sell() && position > 0 {
            match exit_position(ledger, symbol, bar.close, bar.timestamp) {
                Some(exit) => {
                    info!(
                        symbol = %symbol,
                        timestamp = %bar.timestamp,
                        quantity = exit.quantity,
                        price = exit.price,
                        pnl = exit.pnl,
                        "SELL"
                    );
                    Action::Sold {
                        quantity: exit.quantity,
                    }
                }
                None => Action::None,
            }
        } else {
            Action::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;
    use crate::domain::strategy::{PolicyAction, PolicyMode, StrategyConfig};
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    struct NoSentiment;

    impl SentimentOracle for NoSentiment {
        fn sentiment(&self, _symbol: &str, _history: &[OhlcvBar]) -> Option<f64> {
            None
        }
    }

    /// Acts on the bar count of the history it is shown.
    struct ByLength(HashMap<usize, PolicyAction>);

    impl PolicyOracle for ByLength {
        fn action(&self, _symbol: &str, history: &[OhlcvBar], _position: i64) -> Option<PolicyAction> {
            self.0.get(&history.len()).copied()
        }
    }

    fn override_strategy() -> Strategy {
        Strategy::new(StrategyConfig {
            policy_mode: PolicyMode::Override,
            ..StrategyConfig::default()
        })
    }

    #[test]
    fn default_config() {
        let c = BacktestConfig::default();
        assert_relative_eq!(c.initial_capital, 100_000.0);
        assert_relative_eq!(c.execution.allocation_fraction, 0.10);
    }

    #[test]
    fn buy_then_sell_at_higher_price() {
        let mut prices = vec![100.0; 60];
        prices.push(120.0);
        let bars = make_bars(&prices);

        let policy = ByLength(HashMap::from([(55, PolicyAction::Buy), (61, PolicyAction::Sell)]));
        let strategy = override_strategy();
        let sizer = RiskSizer::default();
        let config = BacktestConfig::default();
        let oracles = Oracles {
            sentiment: &NoSentiment,
            policy: &policy,
        };

        let mut backtester = Backtester::new(&strategy, &sizer, oracles, &config);
        assert_eq!(backtester.state(), SimState::AwaitingBar);
        let result = backtester.run_single("GGAL", bars);
        assert_eq!(backtester.state(), SimState::Done);

        let trades = &result.ledger.trades;
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].quantity, 100);
        assert_relative_eq!(trades[0].cash_after, 90_000.0);
        assert_relative_eq!(trades[1].price, 120.0);
        assert_relative_eq!(result.ledger.cash, 102_000.0);
        assert_relative_eq!(result.ledger.equity_curve.last().unwrap().equity, 102_000.0);
    }

    #[test]
    fn evaluation_starts_at_required_minimum() {
        let bars = make_bars(&[100.0; 60]);
        let strategy = Strategy::default();
        let sizer = RiskSizer::default();
        let config = BacktestConfig::default();
        let policy = ByLength(HashMap::new());
        let oracles = Oracles {
            sentiment: &NoSentiment,
            policy: &policy,
        };

        let result = Backtester::new(&strategy, &sizer, oracles, &config).run_single("GGAL", bars);

        // Bars 50..=59 are evaluated.
        assert_eq!(result.evaluated_bars, 10);
        assert_eq!(result.ledger.equity_curve.len(), 10);
        assert_eq!(result.decisions[0].timestamp, result.ledger.equity_curve[0].timestamp);
        assert!(result.decisions.iter().all(|d| d.signal == Signal::Hold));
        assert!(result.ledger.trades.is_empty());
    }

    #[test]
    fn rejected_entry_is_counted_and_leaves_ledger_untouched() {
        // 10% of 500 cash buys zero shares at 100.
        let bars = make_bars(&[100.0; 51]);
        let policy = ByLength(HashMap::from([(51, PolicyAction::Buy)]));
        let strategy = override_strategy();
        let sizer = RiskSizer::default();
        let config = BacktestConfig {
            initial_capital: 500.0,
            ..BacktestConfig::default()
        };
        let oracles = Oracles {
            sentiment: &NoSentiment,
            policy: &policy,
        };

        let result = Backtester::new(&strategy, &sizer, oracles, &config).run_single("GGAL", bars);
        assert_eq!(result.rejected_orders, 1);
        assert_eq!(
            result.decisions[0].action,
            Action::Rejected(RejectReason::ZeroQuantity)
        );
        assert!(result.ledger.trades.is_empty());
        assert_relative_eq!(result.ledger.cash, 500.0);
    }

    #[test]
    fn repeated_buy_does_not_pyramid() {
        let bars = make_bars(&[100.0; 55]);
        let policy = ByLength((50..=55).map(|n| (n, PolicyAction::Buy)).collect());
        let strategy = override_strategy();
        let sizer = RiskSizer::default();
        let config = BacktestConfig::default();
        let oracles = Oracles {
            sentiment: &NoSentiment,
            policy: &policy,
        };

        let result = Backtester::new(&strategy, &sizer, oracles, &config).run_single("GGAL", bars);
        assert_eq!(result.ledger.trades.len(), 1);
        assert_eq!(result.ledger.position_quantity("GGAL"), 100);
        assert_eq!(result.rejected_orders, 0);
    }

    #[test]
    fn first_buy_lands_one_bar_after_warmup() {
        let bars = make_bars(&[100.0; 55]);
        let first_ts = bars[50].timestamp;
        let policy = ByLength((1..=55).map(|n| (n, PolicyAction::Buy)).collect());
        let strategy = override_strategy();
        let sizer = RiskSizer::default();
        let config = BacktestConfig::default();
        let oracles = Oracles {
            sentiment: &NoSentiment,
            policy: &policy,
        };

        let result = Backtester::new(&strategy, &sizer, oracles, &config).run_single("GGAL", bars);
        assert_eq!(result.decisions[0].timestamp, first_ts);
        assert_eq!(result.ledger.trades[0].timestamp, first_ts);
    }

    #[test]
    fn positions_follow_symbol_name_not_bar_tag() {
        // Bars tagged with another symbol still trade and mark under GGAL.
        let mut prices = vec![100.0; 60];
        prices.push(120.0);
        let bars = make_bars(&prices);
        assert_ne!(bars[0].symbol, "GGAL");

        let policy = ByLength(
            (51..=60)
                .map(|n| (n, PolicyAction::Buy))
                .chain([(61, PolicyAction::Sell)])
                .collect(),
        );
        let strategy = override_strategy();
        let sizer = RiskSizer::default();
        let config = BacktestConfig::default();
        let oracles = Oracles {
            sentiment: &NoSentiment,
            policy: &policy,
        };

        let result = Backtester::new(&strategy, &sizer, oracles, &config).run_single("GGAL", bars);
        assert_eq!(result.rejected_orders, 0);
        assert_eq!(result.ledger.trades.len(), 2);
        assert!(result.ledger.trades.iter().all(|t| t.symbol == "GGAL"));
        assert_eq!(result.ledger.position_quantity("GGAL"), 0);
        assert_relative_eq!(result.ledger.cash, 102_000.0);
    }

    #[test]
    fn held_symbol_is_marked_at_latest_close_under_its_name() {
        let mut prices = vec![100.0; 55];
        prices.push(150.0);
        let bars = make_bars(&prices);
        // Buying while held keeps the position through the jump.
        let policy = ByLength((51..=56).map(|n| (n, PolicyAction::Buy)).collect());
        let strategy = override_strategy();
        let sizer = RiskSizer::default();
        let config = BacktestConfig::default();
        let oracles = Oracles {
            sentiment: &NoSentiment,
            policy: &policy,
        };

        let result = Backtester::new(&strategy, &sizer, oracles, &config).run_single("GGAL", bars);
        assert_eq!(result.ledger.position_quantity("GGAL"), 100);
        assert_relative_eq!(
            result.ledger.equity_curve.last().unwrap().equity,
            90_000.0 + 100.0 * 150.0
        );
    }

    #[test]
    fn empty_input_finishes_with_empty_curve() {
        let strategy = Strategy::default();
        let sizer = RiskSizer::default();
        let config = BacktestConfig::default();
        let policy = ByLength(HashMap::new());
        let oracles = Oracles {
            sentiment: &NoSentiment,
            policy: &policy,
        };

        let mut backtester = Backtester::new(&strategy, &sizer, oracles, &config);
        let result = backtester.run(&[]);
        assert_eq!(backtester.state(), SimState::Done);
        assert!(result.ledger.equity_curve.is_empty());
        assert_eq!(result.evaluated_bars, 0);
    }
}
