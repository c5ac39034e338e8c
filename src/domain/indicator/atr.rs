//! Average True Range.
//!
//! True range needs the previous close, so the first usable TR is at index 1.
//! Seed: mean of the first `period` true ranges (indices 1..=period).
//! Subsequent: ATR = (prev_atr * (period - 1) + TR) / period  (Wilder).
//! Warmup: first `period` bars are invalid; `period + 1` bars are needed.

use crate::domain::indicator::{
    warmup_point, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Atr(period);
    if period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: bars.iter().map(|b| warmup_point(b.timestamp)).collect(),
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut tr_sum = 0.0;
    let mut atr = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            values.push(warmup_point(bar.timestamp));
            continue;
        }

        let tr = bar.true_range(bars[i - 1].close);
        if i < period {
            tr_sum += tr;
            values.push(warmup_point(bar.timestamp));
            continue;
        }

        if i == period {
            atr = (tr_sum + tr) / period as f64;
        } else {
            atr = (atr * (period - 1) as f64 + tr) / period as f64;
        }

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid: true,
            value: IndicatorValue::Simple(atr.max(0.0)),
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// ATR at the most recent bar, or 0.0 when fewer than `period + 1` bars exist.
pub fn latest_atr(bars: &[OhlcvBar], period: usize) -> f64 {
    if period == 0 || bars.len() < period + 1 {
        return 0.0;
    }
    let series = calculate_atr(bars, period);
    series
        .last_index()
        .and_then(|i| series.simple_at(i))
        .unwrap_or(0.0)
}
