//! Fixed and replayed oracle implementations.
//!
//! These stand in for the external sentiment and policy models: a neutral
//! default, a constant, and a timestamp-keyed series for replaying recorded
//! scores in backtests.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::strategy::PolicyAction;
use crate::ports::oracle_port::{PolicyOracle, SentimentOracle};

/// Always has no opinion.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralSentiment;

impl SentimentOracle for NeutralSentiment {
    fn sentiment(&self, _symbol: &str, _history: &[OhlcvBar]) -> Option<f64> {
        None
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConstantSentiment(pub f64);

impl SentimentOracle for ConstantSentiment {
    fn sentiment(&self, _symbol: &str, _history: &[OhlcvBar]) -> Option<f64> {
        Some(self.0)
    }
}

/// Scores keyed by bar timestamp. Bars without a recorded score are neutral.
#[derive(Debug, Clone, Default)]
pub struct SentimentSeries {
    scores: HashMap<NaiveDateTime, f64>,
}

impl SentimentSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, timestamp: NaiveDateTime, score: f64) {
        self.scores.insert(timestamp, score);
    }
}

impl FromIterator<(NaiveDateTime, f64)> for SentimentSeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDateTime, f64)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

impl SentimentOracle for SentimentSeries {
    fn sentiment(&self, _symbol: &str, history: &[OhlcvBar]) -> Option<f64> {
        let last = history.last()?;
        self.scores.get(&last.timestamp).copied()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HoldPolicy;

impl PolicyOracle for HoldPolicy {
    fn action(&self, _symbol: &str, _history: &[OhlcvBar], _position: i64) -> Option<PolicyAction> {
        None
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConstantPolicy(pub PolicyAction);

impl PolicyOracle for ConstantPolicy {
    fn action(&self, _symbol: &str, _history: &[OhlcvBar], _position: i64) -> Option<PolicyAction> {
        Some(self.0)
    }
}

/// Actions keyed by bar timestamp.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPolicy {
    actions: HashMap<NaiveDateTime, PolicyAction>,
}

impl ScriptedPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, timestamp: NaiveDateTime, action: PolicyAction) {
        self.actions.insert(timestamp, action);
    }
}

impl FromIterator<(NaiveDateTime, PolicyAction)> for ScriptedPolicy {
    fn from_iter<I: IntoIterator<Item = (NaiveDateTime, PolicyAction)>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}

impl PolicyOracle for ScriptedPolicy {
    fn action(&self, _symbol: &str, history: &[OhlcvBar], _position: i64) -> Option<PolicyAction> {
        let last = history.last()?;
        self.actions.get(&last.timestamp).copied()
    }
}
