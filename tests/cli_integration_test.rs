//! CLI integration tests: config building, validation and the backtest
//! pipeline with real INI and CSV files on disk.

mod common;

use approx::assert_relative_eq;
use clap::Parser;
use common::*;
use sigtrader::adapters::csv_report_adapter::CsvReportAdapter;
use sigtrader::adapters::file_config_adapter::FileConfigAdapter;
use sigtrader::adapters::static_oracles::{HoldPolicy, NeutralSentiment};
use sigtrader::cli::{self, AnalyzeInputs, Cli, Command, Settings};
use sigtrader::domain::backtest::Oracles;
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::execution::SizingMode;
use sigtrader::domain::strategy::{PolicyAction, PolicyMode, SentimentMode};
use sigtrader::ports::report_port::ReportPort;
use std::io::Write;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[indicators]
rsi_period = 10
macd_fast = 8
macd_slow = 21
macd_signal = 5
atr_period = 10
bollinger_period = 20
bollinger_mult = 2.5
min_history = 40

[strategy]
oversold = 25
overbought = 75
sentiment_mode = blend
sentiment_weight = 0.5
sentiment_threshold = 0.2
policy_mode = confirm

[risk]
risk_fraction = 0.01
max_allocation = 0.25
stop_atr_multiple = 3.0

[backtest]
initial_capital = 50000.0
allocation_fraction = 0.2
sizing = risk
symbols = ggal, ypfd
data_dir = /tmp/bars
lookback = 300
mock_seed = 9

[narrator]
volatility_moderate = 0.5
volatility_high = 1.5
"#;

mod config_loading {
    use super::*;

    #[test]
    fn settings_from_full_config() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let settings = Settings::from_config(&adapter).unwrap();

        let ind = &settings.strategy.indicators;
        assert_eq!(ind.rsi_period, 10);
        assert_eq!(ind.macd_fast, 8);
        assert_eq!(ind.macd_slow, 21);
        assert_eq!(ind.macd_signal, 5);
        assert_relative_eq!(ind.bollinger_mult, 2.5);
        assert_eq!(ind.min_history, 40);

        assert_relative_eq!(settings.strategy.oversold, 25.0);
        assert_eq!(
            settings.strategy.sentiment_mode,
            SentimentMode::Blend { weight: 0.5 }
        );
        assert_eq!(settings.strategy.policy_mode, PolicyMode::Confirm);

        assert_relative_eq!(settings.risk.risk_fraction, 0.01);
        assert_relative_eq!(settings.risk.stop_atr_multiple, 3.0);

        assert_relative_eq!(settings.backtest.initial_capital, 50_000.0);
        assert_relative_eq!(settings.backtest.execution.allocation_fraction, 0.2);
        assert_eq!(settings.backtest.execution.sizing, SizingMode::RiskBased);

        assert_eq!(settings.symbols, vec!["GGAL", "YPFD"]);
        assert_eq!(settings.lookback, 300);
        assert_eq!(settings.mock_seed, 9);
        assert_eq!(settings.data_dir.to_str(), Some("/tmp/bars"));

        // Narrator thresholds follow the strategy.
        assert_relative_eq!(settings.narrator.volatility_moderate, 0.5);
        assert_relative_eq!(settings.narrator.oversold, 25.0);
        assert_relative_eq!(settings.narrator.sentiment_threshold, 0.2);
    }

    #[test]
    fn settings_ignore_trailing_comments() {
        let ini = "[strategy]\nsentiment_mode = blend   ; advisory | blend\n\
                   policy_mode = override ; advisory | confirm | override\n\
                   [backtest]\nsizing = risk              ; fixed | risk\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let settings = Settings::from_config(&adapter).unwrap();

        assert_eq!(
            settings.strategy.sentiment_mode,
            SentimentMode::Blend { weight: 1.0 }
        );
        assert_eq!(settings.strategy.policy_mode, PolicyMode::Override);
        assert_eq!(settings.backtest.execution.sizing, SizingMode::RiskBased);
    }

    #[test]
    fn settings_defaults_from_empty_config() {
        let adapter = FileConfigAdapter::from_string("").unwrap();
        let settings = Settings::from_config(&adapter).unwrap();

        assert_eq!(settings.symbols, vec!["GGAL", "YPFD", "PAMP"]);
        assert_eq!(settings.lookback, 500);
        assert_eq!(settings.mock_seed, 42);
        assert_eq!(settings.strategy.policy_mode, PolicyMode::Advisory);
        assert_eq!(settings.backtest.execution.sizing, SizingMode::FixedFraction);
        assert_relative_eq!(settings.backtest.initial_capital, 100_000.0);
    }

    #[test]
    fn invalid_value_is_rejected_before_building() {
        let adapter =
            FileConfigAdapter::from_string("[indicators]\nmacd_fast = 30\nmacd_slow = 26\n")
                .unwrap();
        let err = Settings::from_config(&adapter).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "macd_fast"));
    }

    #[test]
    fn resolve_symbols_prefers_override() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        assert_eq!(
            cli::resolve_symbols(Some("pamp"), &adapter).unwrap(),
            vec!["PAMP"]
        );
        assert_eq!(
            cli::resolve_symbols(None, &adapter).unwrap(),
            vec!["GGAL", "YPFD"]
        );
    }

    #[test]
    fn load_config_from_disk() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(file.path()).unwrap();
        assert!(Settings::from_config(&adapter).is_ok());
    }

    #[test]
    fn load_config_missing_file() {
        let err = cli::load_config(std::path::Path::new("/nonexistent/sigtrader.ini")).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigParse { .. }));
    }
}

mod argument_parsing {
    use super::*;

    #[test]
    fn backtest_arguments() {
        let cli = Cli::try_parse_from([
            "sigtrader", "-vv", "backtest", "-c", "run.ini", "--mock", "--symbol", "GGAL", "-o",
            "out/run",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Backtest {
                symbol,
                mock,
                output,
                ..
            } => {
                assert_eq!(symbol.as_deref(), Some("GGAL"));
                assert!(mock);
                assert_eq!(output.unwrap().to_str(), Some("out/run"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn analyze_accepts_negative_sentiment() {
        let cli = Cli::try_parse_from([
            "sigtrader", "analyze", "-c", "run.ini", "--symbol", "YPFD", "--sentiment", "-0.4",
            "--policy", "2",
        ])
        .unwrap();
        match cli.command {
            Command::Analyze {
                sentiment, policy, ..
            } => {
                assert_eq!(sentiment, Some(-0.4));
                assert_eq!(policy, Some(2));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn analyze_rejects_unknown_policy_code() {
        let result = Cli::try_parse_from([
            "sigtrader", "analyze", "-c", "run.ini", "--symbol", "YPFD", "--policy", "3",
        ]);
        assert!(result.is_err());
    }
}

mod pipeline {
    use super::*;

    fn settings(ini: &str) -> Settings {
        Settings::from_config(&FileConfigAdapter::from_string(ini).unwrap()).unwrap()
    }

    fn neutral() -> Oracles<'static> {
        Oracles {
            sentiment: &NeutralSentiment,
            policy: &HoldPolicy,
        }
    }

    #[test]
    fn mock_pipeline_runs_every_symbol() {
        let settings = settings("[backtest]\nsymbols = GGAL,YPFD,PAMP\nlookback = 200\n");
        let port = settings.data_port(true);

        let (report, result) = cli::run_backtest_pipeline(port.as_ref(), &settings, neutral()).unwrap();

        // 150 evaluated bars per symbol after the 50-bar warmup.
        assert_eq!(report.evaluated_bars, 3 * 150);
        assert_eq!(result.ledger.equity_curve.len(), 150);
        assert!(report.max_drawdown <= 0.0);
        assert!(result.ledger.cash >= 0.0);
    }

    #[test]
    fn pipeline_skips_failing_symbols() {
        let settings = settings("[backtest]\nsymbols = GGAL,YPFD\n");
        let port = MockDataPort::new()
            .with_bars("GGAL", generate_bars("GGAL", &swinging_closes(120)))
            .with_error("YPFD", "timeout");

        let (report, _) = cli::run_backtest_pipeline(&port, &settings, neutral()).unwrap();
        assert_eq!(report.evaluated_bars, 120 - 50);
    }

    #[test]
    fn pipeline_fails_without_any_data() {
        let settings = settings("[backtest]\nsymbols = GGAL\n");
        let port = MockDataPort::new().with_error("GGAL", "timeout");

        let err = cli::run_backtest_pipeline(&port, &settings, neutral()).unwrap_err();
        assert!(matches!(err, SigtraderError::NoData { .. }));
    }

    #[test]
    fn csv_directory_end_to_end() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut csv = String::from("timestamp,open,high,low,close,volume\n");
        for bar in generate_bars("GGAL", &swinging_closes(150)) {
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                bar.timestamp.format("%Y-%m-%d"),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume
            ));
        }
        std::fs::write(dir.path().join("GGAL.csv"), csv).unwrap();

        let ini = format!(
            "[backtest]\nsymbols = GGAL\ndata_dir = {}\n",
            dir.path().display()
        );
        let settings = settings(&ini);
        let port = settings.data_port(false);

        let (report, result) = cli::run_backtest_pipeline(port.as_ref(), &settings, neutral()).unwrap();
        assert_eq!(report.evaluated_bars, 150 - 50);

        let stem = dir.path().join("run");
        CsvReportAdapter::new()
            .write(&report, &result, stem.to_str().unwrap())
            .unwrap();
        assert!(dir.path().join("run_trades.csv").exists());
        assert!(dir.path().join("run_equity.csv").exists());
        assert!(dir.path().join("run_summary.csv").exists());
    }

    #[test]
    fn analyze_renders_signal_sizing_and_narrative() {
        let settings = settings("");
        let bars = generate_bars("GGAL", &swinging_closes(120));

        let lines = cli::analyze_symbol(
            &settings,
            "GGAL",
            &bars,
            AnalyzeInputs {
                sentiment: Some(0.6),
                policy: Some(PolicyAction::Buy),
                position: 0,
                equity: Some(100_000.0),
            },
        );

        assert_eq!(lines[0], "=== GGAL ===");
        assert!(lines.iter().any(|l| l.starts_with("Signal:")));
        assert!(lines.iter().any(|l| l.starts_with("RSI:")));
        assert!(lines.iter().any(|l| l.starts_with("Suggested Qty:")));
        let narrative = lines.last().unwrap();
        assert!(narrative.contains("News sentiment analysis is Positive"));
        assert!(narrative.contains("The learned policy advises to BUY"));
    }

    #[test]
    fn analyze_short_history_explains_hold() {
        let settings = settings("");
        let bars = generate_bars("GGAL", &swinging_closes(30));

        let lines = cli::analyze_symbol(&settings, "GGAL", &bars, AnalyzeInputs::default());
        assert!(lines.iter().any(|l| l.contains("Insufficient data length (30 of 50 bars)")));
        assert!(!lines.iter().any(|l| l.starts_with("RSI:")));
    }
}
