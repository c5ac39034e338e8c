//! Report output port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SigtraderError;
use crate::domain::metrics::Report;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        report: &Report,
        result: &BacktestResult,
        output_path: &str,
    ) -> Result<(), SigtraderError>;
}
