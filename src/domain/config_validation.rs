//! Configuration validation.
//!
//! Validates every section before a run. Absent keys take their defaults;
//! present keys must parse and be in range.

use crate::domain::error::SigtraderError;
use crate::domain::execution::SizingMode;
use crate::domain::strategy::{PolicyMode, SentimentMode};
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_SYMBOLS: &str = "GGAL,YPFD,PAMP";

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_indicator_config(config)?;
    validate_strategy_config(config)?;
    validate_risk_config(config)?;
    validate_backtest_config(config)?;
    validate_narrator_config(config)?;
    Ok(())
}

pub fn validate_indicator_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    for (key, default) in [
        ("rsi_period", 14),
        ("macd_fast", 12),
        ("macd_slow", 26),
        ("macd_signal", 9),
        ("atr_period", 14),
        ("bollinger_period", 20),
        ("min_history", 50),
    ] {
        let value = integer(config, "indicators", key, default)?;
        if value < 1 {
            return Err(SigtraderError::invalid(
                "indicators",
                key,
                format!("{key} must be at least 1"),
            ));
        }
    }

    let fast = integer(config, "indicators", "macd_fast", 12)?;
    let slow = integer(config, "indicators", "macd_slow", 26)?;
    if fast >= slow {
        return Err(SigtraderError::invalid(
            "indicators",
            "macd_fast",
            "macd_fast must be less than macd_slow",
        ));
    }

    let mult = number(config, "indicators", "bollinger_mult", 2.0)?;
    if mult <= 0.0 {
        return Err(SigtraderError::invalid(
            "indicators",
            "bollinger_mult",
            "bollinger_mult must be positive",
        ));
    }
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let oversold = number(config, "strategy", "oversold", 30.0)?;
    let overbought = number(config, "strategy", "overbought", 70.0)?;
    if !(0.0..=100.0).contains(&oversold) || !(0.0..=100.0).contains(&overbought) {
        return Err(SigtraderError::invalid(
            "strategy",
            "oversold",
            "RSI thresholds must be between 0 and 100",
        ));
    }
    if oversold >= overbought {
        return Err(SigtraderError::invalid(
            "strategy",
            "oversold",
            "oversold must be below overbought",
        ));
    }

    let weight = number(config, "strategy", "sentiment_weight", 1.0)?;
    let mode = config
        .get_string("strategy", "sentiment_mode")
        .unwrap_or_else(|| "advisory".to_string());
    if SentimentMode::from_name(&mode, weight).is_none() {
        return Err(SigtraderError::invalid(
            "strategy",
            "sentiment_mode",
            format!("unknown sentiment_mode '{mode}' (expected advisory or blend)"),
        ));
    }

    let threshold = number(config, "strategy", "sentiment_threshold", 0.15)?;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(SigtraderError::invalid(
            "strategy",
            "sentiment_threshold",
            "sentiment_threshold must be between 0 and 1",
        ));
    }

    let policy = config
        .get_string("strategy", "policy_mode")
        .unwrap_or_else(|| "advisory".to_string());
    if PolicyMode::from_name(&policy).is_none() {
        return Err(SigtraderError::invalid(
            "strategy",
            "policy_mode",
            format!("unknown policy_mode '{policy}' (expected advisory, confirm or override)"),
        ));
    }
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    fraction(config, "risk", "risk_fraction", 0.02)?;
    fraction(config, "risk", "max_allocation", 0.20)?;
    let multiple = number(config, "risk", "stop_atr_multiple", 2.0)?;
    if multiple <= 0.0 {
        return Err(SigtraderError::invalid(
            "risk",
            "stop_atr_multiple",
            "stop_atr_multiple must be positive",
        ));
    }
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let capital = number(config, "backtest", "initial_capital", 100_000.0)?;
    if capital <= 0.0 {
        return Err(SigtraderError::invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    fraction(config, "backtest", "allocation_fraction", 0.10)?;

    let sizing = config
        .get_string("backtest", "sizing")
        .unwrap_or_else(|| "fixed".to_string());
    if SizingMode::from_name(&sizing).is_none() {
        return Err(SigtraderError::invalid(
            "backtest",
            "sizing",
            format!("unknown sizing '{sizing}' (expected fixed or risk)"),
        ));
    }

    let symbols = config
        .get_string("backtest", "symbols")
        .unwrap_or_else(|| DEFAULT_SYMBOLS.to_string());
    parse_symbols(&symbols)
        .map_err(|e| SigtraderError::invalid("backtest", "symbols", e.to_string()))?;

    if integer(config, "backtest", "lookback", 500)? < 1 {
        return Err(SigtraderError::invalid(
            "backtest",
            "lookback",
            "lookback must be at least 1",
        ));
    }
    if integer(config, "backtest", "mock_seed", 42)? < 0 {
        return Err(SigtraderError::invalid(
            "backtest",
            "mock_seed",
            "mock_seed must be non-negative",
        ));
    }
    Ok(())
}

pub fn validate_narrator_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let moderate = number(config, "narrator", "volatility_moderate", 1.0)?;
    let high = number(config, "narrator", "volatility_high", 2.0)?;
    if moderate < 0.0 || high <= moderate {
        return Err(SigtraderError::invalid(
            "narrator",
            "volatility_high",
            "volatility thresholds must satisfy 0 <= moderate < high",
        ));
    }
    Ok(())
}

fn number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SigtraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| SigtraderError::invalid(section, key, format!("'{raw}' is not a number"))),
    }
}

fn integer(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, SigtraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
            SigtraderError::invalid(section, key, format!("'{raw}' is not an integer"))
        }),
    }
}

fn fraction(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SigtraderError> {
    let value = number(config, section, key, default)?;
    if value <= 0.0 || value > 1.0 {
        return Err(SigtraderError::invalid(
            section,
            key,
            format!("{key} must be in (0, 1]"),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn invalid_key(err: SigtraderError) -> String {
        match err {
            SigtraderError::ConfigInvalid { key, .. } => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn empty_config_uses_valid_defaults() {
        assert!(validate_config(&make_config("")).is_ok());
    }

    #[test]
    fn full_config_passes() {
        let config = make_config(
            r#"
[indicators]
rsi_period = 14
macd_fast = 12
macd_slow = 26
macd_signal = 9
atr_period = 14
bollinger_period = 20
bollinger_mult = 2.0
min_history = 50

[strategy]
oversold = 30
overbought = 70
sentiment_mode = blend
sentiment_weight = 0.5
policy_mode = confirm

[risk]
risk_fraction = 0.02
max_allocation = 0.2

[backtest]
initial_capital = 100000
allocation_fraction = 0.1
sizing = risk
symbols = GGAL, YPFD
"#,
        );
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_period_fails() {
        let err = validate_config(&make_config("[indicators]\nrsi_period = 0\n")).unwrap_err();
        assert_eq!(invalid_key(err), "rsi_period");
    }

    #[test]
    fn fast_not_below_slow_fails() {
        let err = validate_config(&make_config("[indicators]\nmacd_fast = 26\nmacd_slow = 26\n"))
            .unwrap_err();
        assert_eq!(invalid_key(err), "macd_fast");
    }

    #[test]
    fn non_numeric_value_fails() {
        let err = validate_config(&make_config("[risk]\nrisk_fraction = lots\n")).unwrap_err();
        assert_eq!(invalid_key(err), "risk_fraction");

        let err = validate_config(&make_config("[indicators]\natr_period = 1.5\n")).unwrap_err();
        assert_eq!(invalid_key(err), "atr_period");
    }

    #[test]
    fn thresholds_out_of_order_fail() {
        let err = validate_config(&make_config("[strategy]\noversold = 80\noverbought = 70\n"))
            .unwrap_err();
        assert_eq!(invalid_key(err), "oversold");

        let err = validate_config(&make_config("[strategy]\noverbought = 120\n")).unwrap_err();
        assert_eq!(invalid_key(err), "oversold");
    }

    #[test]
    fn unknown_modes_fail() {
        let err =
            validate_config(&make_config("[strategy]\nsentiment_mode = magic\n")).unwrap_err();
        assert_eq!(invalid_key(err), "sentiment_mode");

        let err = validate_config(&make_config("[strategy]\npolicy_mode = veto\n")).unwrap_err();
        assert_eq!(invalid_key(err), "policy_mode");

        let err = validate_config(&make_config("[backtest]\nsizing = kelly\n")).unwrap_err();
        assert_eq!(invalid_key(err), "sizing");
    }

    #[test]
    fn fractions_must_be_in_unit_interval() {
        let err = validate_config(&make_config("[risk]\nmax_allocation = 0\n")).unwrap_err();
        assert_eq!(invalid_key(err), "max_allocation");

        let err =
            validate_config(&make_config("[backtest]\nallocation_fraction = 1.5\n")).unwrap_err();
        assert_eq!(invalid_key(err), "allocation_fraction");
    }

    #[test]
    fn non_positive_capital_fails() {
        let err =
            validate_config(&make_config("[backtest]\ninitial_capital = -100\n")).unwrap_err();
        assert_eq!(invalid_key(err), "initial_capital");
    }

    #[test]
    fn bad_symbol_list_fails() {
        let err = validate_config(&make_config("[backtest]\nsymbols = GGAL,,YPFD\n")).unwrap_err();
        assert_eq!(invalid_key(err), "symbols");
    }

    #[test]
    fn narrator_thresholds_ordered() {
        let err = validate_config(&make_config(
            "[narrator]\nvolatility_moderate = 3.0\nvolatility_high = 2.0\n",
        ))
        .unwrap_err();
        assert_eq!(invalid_key(err), "volatility_high");
    }
}
