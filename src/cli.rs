//! CLI definition and dispatch.

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::mock_data_adapter::MockDataAdapter;
use crate::adapters::paper_executor::PaperExecutor;
use crate::adapters::static_oracles::{
    ConstantPolicy, ConstantSentiment, HoldPolicy, NeutralSentiment,
};
use crate::domain::backtest::{BacktestConfig, BacktestResult, Backtester, Oracles};
use crate::domain::config_validation::{validate_config, DEFAULT_SYMBOLS};
use crate::domain::error::SigtraderError;
use crate::domain::execution::{ExecutionConfig, SizingMode};
use crate::domain::indicator::IndicatorParams;
use crate::domain::live::{LiveTrader, OrderOutcome};
use crate::domain::metrics::Report;
use crate::domain::narrator::{Decision, Narrator, NarratorConfig};
use crate::domain::risk::{RiskConfig, RiskSizer};
use crate::domain::strategy::{PolicyAction, PolicyMode, SentimentMode, Strategy, StrategyConfig};
use crate::domain::universe::{load_universe, parse_symbols};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::oracle_port::{PolicyOracle, SentimentOracle};
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "sigtrader",
    about = "Multi-signal trading decision engine and backtester"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay history through the strategy with a simulated ledger
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Backtest a single symbol instead of the configured list
        #[arg(long)]
        symbol: Option<String>,
        /// Use the seeded random-walk provider instead of CSV files
        #[arg(long)]
        mock: bool,
        /// Report stem; writes <stem>_summary.csv, _trades.csv, _equity.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Analyze the latest bar of one symbol and explain the decision
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        mock: bool,
        /// Sentiment score in [-1, 1]
        #[arg(long, allow_hyphen_values = true)]
        sentiment: Option<f64>,
        /// Policy action code: 0 hold, 1 buy, 2 sell
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..=2))]
        policy: Option<i64>,
        /// Current position in shares
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        position: i64,
        /// Account equity for sizing (defaults to initial_capital)
        #[arg(long)]
        equity: Option<f64>,
    },
    /// Run one live decision cycle per symbol against the paper executor
    Trade {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        mock: bool,
        /// Make the paper executor refuse every order
        #[arg(long)]
        reject: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Everything a run needs, built from a validated configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub strategy: StrategyConfig,
    pub risk: RiskConfig,
    pub backtest: BacktestConfig,
    pub narrator: NarratorConfig,
    pub symbols: Vec<String>,
    pub data_dir: PathBuf,
    pub lookback: usize,
    pub mock_seed: u64,
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SigtraderError> {
        validate_config(config)?;
        let strategy = build_strategy_config(config)?;
        let narrator = build_narrator_config(config, &strategy);
        Ok(Settings {
            risk: build_risk_config(config),
            backtest: build_backtest_config(config)?,
            symbols: resolve_symbols(None, config)?,
            data_dir: PathBuf::from(
                config
                    .get_string("backtest", "data_dir")
                    .unwrap_or_else(|| "data".to_string()),
            ),
            lookback: config.get_int("backtest", "lookback", 500).max(1) as usize,
            mock_seed: config.get_int("backtest", "mock_seed", 42).max(0) as u64,
            strategy,
            narrator,
        })
    }

    pub fn data_port(&self, mock: bool) -> Box<dyn DataPort> {
        if mock {
            Box::new(MockDataAdapter::new(self.mock_seed, self.symbols.clone()))
        } else {
            Box::new(CsvAdapter::new(self.data_dir.clone()))
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            symbol,
            mock,
            output,
        } => run_backtest(&config, symbol.as_deref(), mock, output.as_deref()),
        Command::Analyze {
            config,
            symbol,
            mock,
            sentiment,
            policy,
            position,
            equity,
        } => run_analyze(
            &config,
            &symbol,
            mock,
            AnalyzeInputs {
                sentiment,
                policy: policy.and_then(PolicyAction::from_code),
                position,
                equity,
            },
        ),
        Command::Trade {
            config,
            mock,
            reject,
        } => run_trade(&config, mock, reject),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SigtraderError> {
    FileConfigAdapter::from_file(path)
}

pub fn build_indicator_params(config: &dyn ConfigPort) -> IndicatorParams {
    let defaults = IndicatorParams::default();
    let period = |key: &str, default: usize| {
        config.get_int("indicators", key, default as i64).max(1) as usize
    };
    IndicatorParams {
        rsi_period: period("rsi_period", defaults.rsi_period),
        macd_fast: period("macd_fast", defaults.macd_fast),
        macd_slow: period("macd_slow", defaults.macd_slow),
        macd_signal: period("macd_signal", defaults.macd_signal),
        atr_period: period("atr_period", defaults.atr_period),
        bollinger_period: period("bollinger_period", defaults.bollinger_period),
        bollinger_mult: config.get_double("indicators", "bollinger_mult", defaults.bollinger_mult),
        min_history: period("min_history", defaults.min_history),
    }
}

pub fn build_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, SigtraderError> {
    let defaults = StrategyConfig::default();

    let weight = config.get_double("strategy", "sentiment_weight", 1.0);
    let sentiment_name = config
        .get_string("strategy", "sentiment_mode")
        .unwrap_or_else(|| "advisory".to_string());
    let sentiment_mode = SentimentMode::from_name(&sentiment_name, weight).ok_or_else(|| {
        SigtraderError::invalid(
            "strategy",
            "sentiment_mode",
            format!("unknown sentiment_mode '{sentiment_name}'"),
        )
    })?;

    let policy_name = config
        .get_string("strategy", "policy_mode")
        .unwrap_or_else(|| "advisory".to_string());
    let policy_mode = PolicyMode::from_name(&policy_name).ok_or_else(|| {
        SigtraderError::invalid(
            "strategy",
            "policy_mode",
            format!("unknown policy_mode '{policy_name}'"),
        )
    })?;

    Ok(StrategyConfig {
        indicators: build_indicator_params(config),
        oversold: config.get_double("strategy", "oversold", defaults.oversold),
        overbought: config.get_double("strategy", "overbought", defaults.overbought),
        sentiment_mode,
        sentiment_threshold: config.get_double(
            "strategy",
            "sentiment_threshold",
            defaults.sentiment_threshold,
        ),
        policy_mode,
    })
}

pub fn build_risk_config(config: &dyn ConfigPort) -> RiskConfig {
    let defaults = RiskConfig::default();
    RiskConfig {
        risk_fraction: config.get_double("risk", "risk_fraction", defaults.risk_fraction),
        max_allocation: config.get_double("risk", "max_allocation", defaults.max_allocation),
        stop_atr_multiple: config.get_double(
            "risk",
            "stop_atr_multiple",
            defaults.stop_atr_multiple,
        ),
    }
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SigtraderError> {
    let defaults = BacktestConfig::default();

    let sizing_name = config
        .get_string("backtest", "sizing")
        .unwrap_or_else(|| "fixed".to_string());
    let sizing = SizingMode::from_name(&sizing_name).ok_or_else(|| {
        SigtraderError::invalid(
            "backtest",
            "sizing",
            format!("unknown sizing '{sizing_name}'"),
        )
    })?;

    Ok(BacktestConfig {
        initial_capital: config.get_double(
            "backtest",
            "initial_capital",
            defaults.initial_capital,
        ),
        execution: ExecutionConfig {
            allocation_fraction: config.get_double(
                "backtest",
                "allocation_fraction",
                defaults.execution.allocation_fraction,
            ),
            sizing,
        },
    })
}

/// RSI and sentiment thresholds follow the strategy so the narrative agrees
/// with the signal.
pub fn build_narrator_config(config: &dyn ConfigPort, strategy: &StrategyConfig) -> NarratorConfig {
    let defaults = NarratorConfig::default();
    NarratorConfig {
        volatility_moderate: config.get_double(
            "narrator",
            "volatility_moderate",
            defaults.volatility_moderate,
        ),
        volatility_high: config.get_double("narrator", "volatility_high", defaults.volatility_high),
        oversold: strategy.oversold,
        overbought: strategy.overbought,
        sentiment_threshold: strategy.sentiment_threshold,
    }
}

pub fn resolve_symbols(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, SigtraderError> {
    let raw = match symbol_override {
        Some(s) => s.to_string(),
        None => config
            .get_string("backtest", "symbols")
            .unwrap_or_else(|| DEFAULT_SYMBOLS.to_string()),
    };
    parse_symbols(&raw).map_err(|e| SigtraderError::invalid("backtest", "symbols", e.to_string()))
}

fn run_backtest(
    config_path: &Path,
    symbol_override: Option<&str>,
    mock: bool,
    output: Option<&Path>,
) -> Result<(), SigtraderError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let mut settings = Settings::from_config(&adapter)?;
    if symbol_override.is_some() {
        settings.symbols = resolve_symbols(symbol_override, &adapter)?;
    }

    let data_port = settings.data_port(mock);
    let (report, result) = run_backtest_pipeline(
        data_port.as_ref(),
        &settings,
        Oracles {
            sentiment: &NeutralSentiment,
            policy: &HoldPolicy,
        },
    )?;

    print_summary(&report);

    if let Some(stem) = output {
        let stem = stem.to_string_lossy();
        CsvReportAdapter::new().write(&report, &result, &stem)?;
        eprintln!(
            "\nReport written to: {}",
            CsvReportAdapter::output_file(&stem, "summary").display()
        );
    }
    Ok(())
}

/// Loads the universe, replays it and computes the report.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    settings: &Settings,
    oracles: Oracles<'_>,
) -> Result<(Report, BacktestResult), SigtraderError> {
    let strategy = Strategy::new(settings.strategy.clone());
    let sizer = RiskSizer::new(settings.risk.clone());

    let universe = load_universe(
        data_port,
        &settings.symbols,
        settings.lookback,
        strategy.required_minimum(),
    )?;
    for skipped in &universe.skipped {
        eprintln!("warning: skipping {} ({:?})", skipped.symbol, skipped.reason);
    }

    eprintln!(
        "Running backtest: {} symbols, warmup {} bars",
        universe.symbols.len(),
        strategy.required_minimum()
    );

    let mut backtester = Backtester::new(&strategy, &sizer, oracles, &settings.backtest);
    let result = backtester.run(&universe.symbols);
    let report = Report::compute(&result);
    Ok((report, result))
}

fn print_summary(report: &Report) {
    eprintln!("\n=== Backtest Results ===");
    eprintln!("Initial Capital:  {:.2}", report.initial_capital);
    eprintln!("Final Equity:     {:.2}", report.final_equity);
    eprintln!("Total Return:     {:.2}%", report.total_return * 100.0);
    eprintln!("Max Drawdown:     {:.2}%", report.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", report.total_trades);
    eprintln!("Round Trips:      {}", report.round_trips);
    eprintln!("Win Rate:         {:.1}%", report.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", report.profit_factor);
    eprintln!("Evaluated Bars:   {}", report.evaluated_bars);
    eprintln!("Rejected Orders:  {}", report.rejected_orders);

    if !report.per_symbol.is_empty() {
        eprintln!("\n=== Per-Symbol Summary ===");
        for s in &report.per_symbol {
            let pnl_sign = if s.realized_pnl >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {}:  {} trades, {:.1}% win rate, {}${:.0}",
                s.symbol,
                s.trades,
                s.win_rate * 100.0,
                pnl_sign,
                s.realized_pnl,
            );
        }
    }
}

/// Command-line overrides for a single analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeInputs {
    pub sentiment: Option<f64>,
    pub policy: Option<PolicyAction>,
    pub position: i64,
    pub equity: Option<f64>,
}

fn run_analyze(
    config_path: &Path,
    symbol: &str,
    mock: bool,
    inputs: AnalyzeInputs,
) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let settings = Settings::from_config(&adapter)?;
    let symbol = symbol.trim().to_uppercase();
    let history = settings.data_port(mock).fetch_history(&symbol, settings.lookback)?;

    let lines = analyze_symbol(&settings, &symbol, &history, inputs);
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// Renders one analysis as report lines.
pub fn analyze_symbol(
    settings: &Settings,
    symbol: &str,
    history: &[crate::domain::ohlcv::OhlcvBar],
    inputs: AnalyzeInputs,
) -> Vec<String> {
    let strategy = Strategy::new(settings.strategy.clone());
    let sizer = RiskSizer::new(settings.risk.clone());
    let narrator = Narrator::new(settings.narrator.clone());

    let sentiment: Box<dyn SentimentOracle> = match inputs.sentiment {
        Some(score) => Box::new(ConstantSentiment(score)),
        None => Box::new(NeutralSentiment),
    };
    let policy: Box<dyn PolicyOracle> = match inputs.policy {
        Some(action) => Box::new(ConstantPolicy(action)),
        None => Box::new(HoldPolicy),
    };

    let analysis = strategy.analyze(
        symbol,
        history,
        sentiment.sentiment(symbol, history),
        policy.action(symbol, history, inputs.position),
        inputs.position,
    );
    let equity = inputs.equity.unwrap_or(settings.backtest.initial_capital);
    let quantity = sizer.size(symbol, analysis.price, analysis.volatility, equity);

    let mut lines = vec![
        format!("=== {} ===", analysis.symbol),
        format!("Signal:           {}", analysis.signal),
        format!("Technical:        {}", analysis.technical_signal),
        format!("Reason:           {}", analysis.reason),
        format!("Price:            {:.2}", analysis.price),
    ];
    if let Some(ind) = analysis.indicators {
        lines.push(format!("RSI:              {:.2}", ind.rsi));
        lines.push(format!(
            "MACD:             {:.4} (signal {:.4})",
            ind.macd_line, ind.macd_signal
        ));
        lines.push(format!("ATR:              {:.2}", ind.atr));
        lines.push(format!(
            "Bollinger:        {:.2} / {:.2} / {:.2}",
            ind.band_lower, ind.band_middle, ind.band_upper
        ));
    }
    lines.push(format!("Suggested Qty:    {}", quantity));
    if analysis.volatility > 0.0 {
        lines.push(format!(
            "Stop Price:       {:.2}",
            sizer.stop_price(analysis.price, analysis.volatility)
        ));
    }
    lines.push(String::new());
    lines.push(narrator.explain(&Decision::from_analysis(&analysis)));
    lines
}

fn run_trade(config_path: &Path, mock: bool, reject: bool) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let settings = Settings::from_config(&adapter)?;
    let data_port = settings.data_port(mock);

    let strategy = Strategy::new(settings.strategy.clone());
    let sizer = RiskSizer::new(settings.risk.clone());
    let narrator = Narrator::new(settings.narrator.clone());
    let mut executor = if reject {
        PaperExecutor::rejecting()
    } else {
        PaperExecutor::new()
    };

    {
        let mut trader = LiveTrader::new(
            &strategy,
            &sizer,
            &narrator,
            Oracles {
                sentiment: &NeutralSentiment,
                policy: &HoldPolicy,
            },
            &mut executor,
            settings.backtest.initial_capital,
        );

        for symbol in &settings.symbols {
            let history = match data_port.fetch_history(symbol, settings.lookback) {
                Ok(bars) => bars,
                Err(e) => {
                    eprintln!("warning: skipping {} ({})", symbol, e);
                    continue;
                }
            };

            let outcome = trader.process_cycle(symbol, &history);
            println!("{}", outcome.narrative);
            match outcome.order {
                OrderOutcome::NoAction => println!("  {}: no order", symbol),
                OrderOutcome::Ignored => {
                    println!("  {}: {} ignored", symbol, outcome.analysis.signal)
                }
                OrderOutcome::Filled {
                    side,
                    quantity,
                    price,
                } => println!("  {}: {} {} @ {:.2}", symbol, side, quantity, price),
                OrderOutcome::Failed { side, reason } => {
                    println!("  {}: {} failed ({})", symbol, side, reason)
                }
            }
        }
    }

    eprintln!("{} paper orders recorded", executor.orders().len());
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), SigtraderError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    let settings = Settings::from_config(&adapter)?;
    let strategy = Strategy::new(settings.strategy.clone());

    eprintln!("  symbols:   {}", settings.symbols.join(", "));
    eprintln!("  warmup:    {} bars", strategy.required_minimum());
    eprintln!("  sentiment: {:?}", settings.strategy.sentiment_mode);
    eprintln!("  policy:    {:?}", settings.strategy.policy_mode);
    eprintln!("  sizing:    {:?}", settings.backtest.execution.sizing);
    eprintln!("\nConfiguration is valid");
    Ok(())
}
