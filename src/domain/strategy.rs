//! Signal strategy: RSI extremes and MACD crossovers scored into a discrete
//! signal, with optional sentiment and learned-policy inputs.

use std::fmt;

use tracing::debug;

use crate::domain::indicator::set::IndicatorPair;
use crate::domain::indicator::{IndicatorParams, IndicatorSet};
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Signal {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Signal {
    /// Maps a score to a signal. Scores outside [-2, 2] saturate.
    pub fn from_score(score: i32) -> Signal {
        match score {
            s if s >= 2 => Signal::StrongBuy,
            1 => Signal::Buy,
            0 => Signal::Hold,
            -1 => Signal::Sell,
            _ => Signal::StrongSell,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Signal::StrongBuy | Signal::Buy)
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Signal::StrongSell | Signal::Sell)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::StrongBuy => "STRONG_BUY",
            Signal::Buy => "BUY",
            Signal::Hold => "HOLD",
            Signal::Sell => "SELL",
            Signal::StrongSell => "STRONG_SELL",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triggered conditions, in the order they are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    RsiOversold,
    RsiOverbought,
    MacdCrossUp,
    MacdCrossDown,
    SentimentBullish,
    SentimentBearish,
    PolicyBuy,
    PolicySell,
    PolicyRejected,
    PolicyOverride,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Condition::RsiOversold => "RSI Oversold",
            Condition::RsiOverbought => "RSI Overbought",
            Condition::MacdCrossUp => "MACD Bullish Crossover",
            Condition::MacdCrossDown => "MACD Bearish Crossover",
            Condition::SentimentBullish => "Sentiment Bullish",
            Condition::SentimentBearish => "Sentiment Bearish",
            Condition::PolicyBuy => "Policy Buy",
            Condition::PolicySell => "Policy Sell",
            Condition::PolicyRejected => "Policy Rejected",
            Condition::PolicyOverride => "Policy Override",
        };
        f.write_str(name)
    }
}

/// Discrete action from a learned policy: 0 = Hold, 1 = Buy, 2 = Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PolicyAction {
    #[default]
    Hold,
    Buy,
    Sell,
}

impl PolicyAction {
    pub fn from_code(code: i64) -> Option<PolicyAction> {
        match code {
            0 => Some(PolicyAction::Hold),
            1 => Some(PolicyAction::Buy),
            2 => Some(PolicyAction::Sell),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            PolicyAction::Hold => 0,
            PolicyAction::Buy => 1,
            PolicyAction::Sell => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PolicyAction::Hold => "HOLD",
            PolicyAction::Buy => "BUY",
            PolicyAction::Sell => "SELL",
        }
    }
}

/// How the sentiment scalar affects the score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SentimentMode {
    /// Annotates the reason only; the technical score is authoritative.
    #[default]
    Advisory,
    /// `round(technical + weight * sentiment)`, clamped to [-2, 2].
    Blend { weight: f64 },
}

impl SentimentMode {
    pub fn from_name(name: &str, weight: f64) -> Option<SentimentMode> {
        match name.trim().to_ascii_lowercase().as_str() {
            "advisory" => Some(SentimentMode::Advisory),
            "blend" => Some(SentimentMode::Blend { weight }),
            _ => None,
        }
    }
}

/// How the learned-policy action affects the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyMode {
    /// Recorded and annotated only.
    #[default]
    Advisory,
    /// Buy/sell signals survive only when the policy agrees.
    Confirm,
    /// A Buy or Sell action forces at least that side.
    Override,
}

impl PolicyMode {
    pub fn from_name(name: &str) -> Option<PolicyMode> {
        match name.trim().to_ascii_lowercase().as_str() {
            "advisory" => Some(PolicyMode::Advisory),
            "confirm" => Some(PolicyMode::Confirm),
            "override" => Some(PolicyMode::Override),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub indicators: IndicatorParams,
    pub oversold: f64,
    pub overbought: f64,
    pub sentiment_mode: SentimentMode,
    pub sentiment_threshold: f64,
    pub policy_mode: PolicyMode,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            indicators: IndicatorParams::default(),
            oversold: 30.0,
            overbought: 70.0,
            sentiment_mode: SentimentMode::Advisory,
            sentiment_threshold: 0.15,
            policy_mode: PolicyMode::Advisory,
        }
    }
}

/// Result of one strategy evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub symbol: String,
    pub signal: Signal,
    /// Signal from indicators alone, before sentiment and policy.
    pub technical_signal: Signal,
    pub conditions: Vec<Condition>,
    pub reason: String,
    /// Rounded snapshot; `None` when the history was too short.
    pub indicators: Option<IndicatorSet>,
    /// Close of the last bar, 0.0 for an empty history.
    pub price: f64,
    pub technical_score: i32,
    pub final_score: i32,
    pub sentiment: f64,
    pub policy: PolicyAction,
    pub position: i64,
    /// Unrounded ATR at the last bar, 0.0 when unavailable.
    pub volatility: f64,
}

impl Analysis {
    fn hold(symbol: &str, price: f64, reason: String, position: i64) -> Analysis {
        Analysis {
            symbol: symbol.to_string(),
            signal: Signal::Hold,
            technical_signal: Signal::Hold,
            conditions: Vec::new(),
            reason,
            indicators: None,
            price,
            technical_score: 0,
            final_score: 0,
            sentiment: 0.0,
            policy: PolicyAction::Hold,
            position,
            volatility: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Strategy {
    config: StrategyConfig,
}

impl Strategy {
    pub fn new(config: StrategyConfig) -> Self {
        Strategy { config }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn required_minimum(&self) -> usize {
        self.config.indicators.required_minimum()
    }

    pub fn analyze(
        &self,
        symbol: &str,
        history: &[OhlcvBar],
        sentiment: Option<f64>,
        policy: Option<PolicyAction>,
        position: i64,
    ) -> Analysis {
        let Some(last) = history.last() else {
            return Analysis::hold(symbol, 0.0, "No data".into(), position);
        };

        let minimum = self.required_minimum();
        let Some(pair) = IndicatorPair::compute(history, &self.config.indicators) else {
            return Analysis::hold(
                symbol,
                last.close,
                format!(
                    "Insufficient data length ({} of {} bars)",
                    history.len(),
                    minimum
                ),
                position,
            );
        };

        let current = pair.current;
        let mut conditions = Vec::new();
        let mut details = Vec::new();
        let mut technical_score = 0;

        if current.rsi < self.config.oversold {
            technical_score += 1;
            conditions.push(Condition::RsiOversold);
            details.push(format!("{} ({:.2})", Condition::RsiOversold, current.rsi));
        } else if current.rsi > self.config.overbought {
            technical_score -= 1;
            conditions.push(Condition::RsiOverbought);
            details.push(format!("{} ({:.2})", Condition::RsiOverbought, current.rsi));
        }

        if let Some(prev) = pair.previous {
            if prev.macd_line <= prev.macd_signal && current.macd_line > current.macd_signal {
                technical_score += 1;
                conditions.push(Condition::MacdCrossUp);
                details.push(Condition::MacdCrossUp.to_string());
            } else if prev.macd_line >= prev.macd_signal && current.macd_line < current.macd_signal
            {
                technical_score -= 1;
                conditions.push(Condition::MacdCrossDown);
                details.push(Condition::MacdCrossDown.to_string());
            }
        }

        let sentiment = sentiment
            .filter(|s| s.is_finite())
            .map(|s| s.clamp(-1.0, 1.0))
            .unwrap_or(0.0);
        if sentiment > self.config.sentiment_threshold {
            conditions.push(Condition::SentimentBullish);
            details.push(format!("{} ({:.2})", Condition::SentimentBullish, sentiment));
        } else if sentiment < -self.config.sentiment_threshold {
            conditions.push(Condition::SentimentBearish);
            details.push(format!("{} ({:.2})", Condition::SentimentBearish, sentiment));
        }

        let final_score = match self.config.sentiment_mode {
            SentimentMode::Advisory => technical_score,
            SentimentMode::Blend { weight } => {
                let blended = technical_score as f64 + weight * sentiment;
                (blended.round() as i32).clamp(-2, 2)
            }
        };

        let technical_signal = Signal::from_score(technical_score);
        let policy = policy.unwrap_or_default();
        let mut signal = Signal::from_score(final_score);

        match self.config.policy_mode {
            PolicyMode::Advisory => {}
            PolicyMode::Confirm => {
                let confirmed = (signal.is_buy() && policy == PolicyAction::Buy)
                    || (signal.is_sell() && policy == PolicyAction::Sell);
                if signal != Signal::Hold && !confirmed {
                    signal = Signal::Hold;
                    conditions.push(Condition::PolicyRejected);
                    details.push(format!(
                        "{} (policy {})",
                        Condition::PolicyRejected,
                        policy.label()
                    ));
                }
            }
            PolicyMode::Override => {
                let forced = match policy {
                    PolicyAction::Buy if !signal.is_buy() => Some(Signal::Buy),
                    PolicyAction::Sell if !signal.is_sell() => Some(Signal::Sell),
                    _ => None,
                };
                if let Some(forced) = forced {
                    signal = forced;
                    conditions.push(Condition::PolicyOverride);
                    details.push(format!("{} ({})", Condition::PolicyOverride, forced));
                }
            }
        }

        match policy {
            PolicyAction::Buy => conditions.push(Condition::PolicyBuy),
            PolicyAction::Sell => conditions.push(Condition::PolicySell),
            PolicyAction::Hold => {}
        }

        let reason = if details.is_empty() {
            "No technical trigger".to_string()
        } else {
            details.join(", ")
        };

        debug!(
            symbol,
            signal = %signal,
            technical_score,
            final_score,
            sentiment,
            policy = policy.label(),
            position,
            "analysis complete"
        );

        Analysis {
            symbol: symbol.to_string(),
            signal,
            technical_signal,
            conditions,
            reason,
            indicators: Some(current.rounded()),
            price: last.close,
            technical_score,
            final_score,
            sentiment,
            policy,
            position,
            volatility: current.atr,
        }
    }
}
