//! Core domain types and decision logic.

pub mod ohlcv;
pub mod indicator;
pub mod strategy;
pub mod risk;
pub mod narrator;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod symbol_data;
pub mod universe;
pub mod backtest;
pub mod metrics;
pub mod live;
pub mod config_validation;
pub mod error;
