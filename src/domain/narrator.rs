//! Plain-language explanation of a decision. Pure; callers decide whether to
//! print or log the result.

use crate::domain::strategy::{Analysis, PolicyAction, Signal};

#[derive(Debug, Clone, PartialEq)]
pub struct NarratorConfig {
    /// ATR at or above this is Moderate.
    pub volatility_moderate: f64,
    /// ATR at or above this is High.
    pub volatility_high: f64,
    pub oversold: f64,
    pub overbought: f64,
    pub sentiment_threshold: f64,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        NarratorConfig {
            volatility_moderate: 1.0,
            volatility_high: 2.0,
            oversold: 30.0,
            overbought: 70.0,
            sentiment_threshold: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityLevel {
    Low,
    Moderate,
    High,
}

impl VolatilityLevel {
    pub fn label(&self) -> &'static str {
        match self {
            VolatilityLevel::Low => "Low",
            VolatilityLevel::Moderate => "Moderate",
            VolatilityLevel::High => "High",
        }
    }
}

/// Inputs to one explanation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision<'a> {
    pub symbol: &'a str,
    pub momentum: f64,
    pub sentiment: f64,
    pub policy: PolicyAction,
    pub technical_signal: Signal,
    pub volatility: f64,
    pub final_signal: Signal,
}

impl<'a> Decision<'a> {
    /// Momentum reads as neutral (50) when the analysis had no indicators.
    pub fn from_analysis(analysis: &'a Analysis) -> Decision<'a> {
        Decision {
            symbol: &analysis.symbol,
            momentum: analysis.indicators.map(|s| s.rsi).unwrap_or(50.0),
            sentiment: analysis.sentiment,
            policy: analysis.policy,
            technical_signal: analysis.technical_signal,
            volatility: analysis.volatility,
            final_signal: analysis.signal,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Narrator {
    config: NarratorConfig,
}

impl Narrator {
    pub fn new(config: NarratorConfig) -> Self {
        Narrator { config }
    }

    pub fn volatility_level(&self, atr: f64) -> VolatilityLevel {
        if atr >= self.config.volatility_high {
            VolatilityLevel::High
        } else if atr >= self.config.volatility_moderate {
            VolatilityLevel::Moderate
        } else {
            VolatilityLevel::Low
        }
    }

    pub fn explain(&self, decision: &Decision<'_>) -> String {
        let mut sentences = Vec::with_capacity(5);

        sentences.push(format!(
            "Market context for {} shows {} volatility (ATR: {:.2}).",
            decision.symbol,
            self.volatility_level(decision.volatility).label(),
            decision.volatility
        ));

        let momentum_view = if decision.momentum < self.config.oversold {
            "Oversold (Bullish)"
        } else if decision.momentum > self.config.overbought {
            "Overbought (Bearish)"
        } else {
            "Neutral"
        };
        sentences.push(format!(
            "Technical indicators suggest the asset is {} (RSI: {:.1}).",
            momentum_view, decision.momentum
        ));

        let sentiment_view = if decision.sentiment > self.config.sentiment_threshold {
            "Positive"
        } else if decision.sentiment < -self.config.sentiment_threshold {
            "Negative"
        } else {
            "Neutral"
        };
        sentences.push(format!(
            "News sentiment analysis is {} ({:.2}).",
            sentiment_view, decision.sentiment
        ));

        sentences.push(format!(
            "The learned policy advises to {}.",
            decision.policy.label()
        ));

        sentences.push(conclusion(decision));
        sentences.join(" ")
    }
}

fn conclusion(decision: &Decision<'_>) -> String {
    let signal = decision.final_signal;
    if signal.is_buy() {
        let reason = if decision.technical_signal == Signal::Hold
            && decision.policy == PolicyAction::Buy
        {
            "learned policy conviction overriding neutral technicals"
        } else {
            "alignment between technicals and auxiliary models"
        };
        format!("CONCLUSION: Executing {} order due to {}.", signal, reason)
    } else if signal.is_sell() {
        let reason = if decision.policy == PolicyAction::Sell {
            "learned policy safety trigger"
        } else {
            "deteriorating conditions"
        };
        format!("CONCLUSION: Executing {} order triggered by {}.", signal, reason)
    } else {
        "CONCLUSION: Holding position. Waiting for clearer signal alignment.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision() -> Decision<'static> {
        Decision {
            symbol: "GGAL",
            momentum: 50.0,
            sentiment: 0.0,
            policy: PolicyAction::Hold,
            technical_signal: Signal::Hold,
            volatility: 0.5,
            final_signal: Signal::Hold,
        }
    }

    #[test]
    fn volatility_levels() {
        let narrator = Narrator::default();
        assert_eq!(narrator.volatility_level(0.99), VolatilityLevel::Low);
        assert_eq!(narrator.volatility_level(1.0), VolatilityLevel::Moderate);
        assert_eq!(narrator.volatility_level(1.99), VolatilityLevel::Moderate);
        assert_eq!(narrator.volatility_level(2.0), VolatilityLevel::High);
    }

    #[test]
    fn hold_narrative_in_order() {
        let text = Narrator::default().explain(&decision());
        assert_eq!(
            text,
            "Market context for GGAL shows Low volatility (ATR: 0.50). \
             Technical indicators suggest the asset is Neutral (RSI: 50.0). \
             News sentiment analysis is Neutral (0.00). \
             The learned policy advises to HOLD. \
             CONCLUSION: Holding position. Waiting for clearer signal alignment."
        );
    }

    #[test]
    fn classifications() {
        let text = Narrator::default().explain(&Decision {
            momentum: 25.0,
            sentiment: 0.4,
            volatility: 2.5,
            ..decision()
        });
        assert!(text.contains("High volatility"));
        assert!(text.contains("Oversold (Bullish)"));
        assert!(text.contains("Positive (0.40)"));

        let text = Narrator::default().explain(&Decision {
            momentum: 75.0,
            sentiment: -0.2,
            ..decision()
        });
        assert!(text.contains("Overbought (Bearish)"));
        assert!(text.contains("Negative (-0.20)"));
    }

    #[test]
    fn policy_conviction_conclusion() {
        let text = Narrator::default().explain(&Decision {
            policy: PolicyAction::Buy,
            final_signal: Signal::Buy,
            ..decision()
        });
        assert!(text.ends_with(
            "CONCLUSION: Executing BUY order due to learned policy conviction overriding neutral technicals."
        ));
    }

    #[test]
    fn sell_conclusions() {
        let safety = Narrator::default().explain(&Decision {
            policy: PolicyAction::Sell,
            final_signal: Signal::Sell,
            ..decision()
        });
        assert!(safety.ends_with("triggered by learned policy safety trigger."));

        let technical = Narrator::default().explain(&Decision {
            technical_signal: Signal::StrongSell,
            final_signal: Signal::StrongSell,
            ..decision()
        });
        assert!(technical.contains("Executing STRONG_SELL order triggered by deteriorating conditions."));
    }

    #[test]
    fn custom_thresholds() {
        let narrator = Narrator::new(NarratorConfig {
            volatility_moderate: 5.0,
            volatility_high: 10.0,
            ..NarratorConfig::default()
        });
        assert_eq!(narrator.volatility_level(4.0), VolatilityLevel::Low);
        assert_eq!(narrator.volatility_level(10.0), VolatilityLevel::High);
    }
}
