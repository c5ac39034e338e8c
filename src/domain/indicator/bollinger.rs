//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

pub fn calculate_bollinger(bars: &[OhlcvBar], period: usize, multiplier: f64) -> IndicatorSeries {
    let stddev_mult_x100 = (multiplier * 100.0).round().max(0.0) as u32;
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let valid = period > 0 && i + 1 >= period;

        let (upper, middle, lower) = if valid {
            let window = &bars[i + 1 - period..=i];
            let (mean, stddev) = mean_and_stddev(window.iter().map(|b| b.close), period);
            (mean + multiplier * stddev, mean, mean - multiplier * stddev)
        } else {
            (0.0, 0.0, 0.0)
        };

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value: IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}

/// Population mean and standard deviation of exactly `n` values.
fn mean_and_stddev(values: impl Iterator<Item = f64> + Clone, n: usize) -> (f64, f64) {
    let mean = values.clone().sum::<f64>() / n as f64;
    let variance = values
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / n as f64;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;
    use approx::assert_relative_eq;

    fn bands(series: &IndicatorSeries, i: usize) -> (f64, f64, f64) {
        match series.valid_at(i) {
            Some(IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            }) => (*upper, *middle, *lower),
            other => panic!("Expected Bollinger value, got {:?}", other),
        }
    }

    #[test]
    fn bollinger_warmup() {
        let series = calculate_bollinger(&make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3, 2.0);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2..].iter().all(|p| p.valid));
    }

    #[test]
    fn bollinger_constant_values_collapse() {
        let series = calculate_bollinger(&make_bars(&[100.0; 5]), 3, 2.0);
        let (upper, middle, lower) = bands(&series, 2);
        assert_relative_eq!(middle, 100.0);
        assert_relative_eq!(upper, 100.0);
        assert_relative_eq!(lower, 100.0);
    }

    #[test]
    fn bollinger_basic_calculation() {
        let series = calculate_bollinger(&make_bars(&[10.0, 20.0, 30.0]), 3, 2.0);
        let (upper, middle, lower) = bands(&series, 2);

        let stddev = (200.0_f64 / 3.0).sqrt();
        assert_relative_eq!(middle, 20.0, epsilon = 1e-10);
        assert_relative_eq!(upper, 20.0 + 2.0 * stddev, epsilon = 1e-10);
        assert_relative_eq!(lower, 20.0 - 2.0 * stddev, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_multiplier_variations() {
        let series = calculate_bollinger(&make_bars(&[10.0, 20.0, 30.0]), 3, 1.0);
        let (upper, _, lower) = bands(&series, 2);

        let stddev = (200.0_f64 / 3.0).sqrt();
        assert_relative_eq!(upper - lower, 2.0 * stddev, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_indicator_type() {
        let series = calculate_bollinger(&make_bars(&[10.0, 20.0, 30.0]), 20, 2.0);
        assert_eq!(
            series.indicator_type,
            IndicatorType::Bollinger {
                period: 20,
                stddev_mult_x100: 200
            }
        );
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn bollinger_symmetry() {
        let series = calculate_bollinger(&make_bars(&[10.0, 25.0, 30.0, 12.0]), 3, 2.0);
        let (upper, middle, lower) = bands(&series, 3);
        assert_relative_eq!(upper - middle, middle - lower, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_zero_period_never_valid() {
        let series = calculate_bollinger(&make_bars(&[10.0, 20.0]), 0, 2.0);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}
