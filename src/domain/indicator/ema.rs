//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = EMA[i-1] + k*(C[i] - EMA[i-1]).
//! Warmup: first (n-1) bars are invalid.
//!
//! The update is written in delta form so a constant input keeps the EMA
//! exactly equal to that constant.

use crate::domain::indicator::{
    warmup_point, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(period),
            values: Vec::new(),
        };
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let raw = ema_values(&closes, period);

    let values = bars
        .iter()
        .zip(raw)
        .map(|(bar, ema)| match ema {
            Some(v) => IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Simple(v),
            },
            None => warmup_point(bar.timestamp),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

/// EMA over an arbitrary slice; `None` during warmup.
pub(crate) fn ema_values(input: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(input.len());
    if period == 0 {
        out.resize(input.len(), None);
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, &x) in input.iter().enumerate() {
        if i < period - 1 {
            sum += x;
            out.push(None);
        } else if i == period - 1 {
            sum += x;
            ema = sum / period as f64;
            out.push(Some(ema));
        } else {
            ema += k * (x - ema);
            out.push(Some(ema));
        }
    }

    out
}
