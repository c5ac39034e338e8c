//! CSV report adapter implementing ReportPort.
//!
//! Writes three files next to `output_path`'s stem:
//! `<stem>_summary.csv`, `<stem>_trades.csv` and `<stem>_equity.csv`.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SigtraderError;
use crate::domain::metrics::Report;
use crate::ports::report_port::ReportPort;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }

    /// `reports/run.csv` -> `reports/run_<suffix>.csv`
    pub fn output_file(output_path: &str, suffix: &str) -> PathBuf {
        let path = Path::new(output_path);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        path.with_file_name(format!("{}_{}.csv", stem, suffix))
    }

    fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>, SigtraderError> {
        csv::Writer::from_path(path).map_err(|e| report_error(path, e))
    }

    fn write_summary(report: &Report, path: &Path) -> Result<(), SigtraderError> {
        let mut wtr = Self::writer(path)?;
        let rows: Vec<(&str, String)> = vec![
            ("initial_capital", format!("{:.2}", report.initial_capital)),
            ("final_equity", format!("{:.2}", report.final_equity)),
            ("total_return", format!("{:.6}", report.total_return)),
            ("max_drawdown", format!("{:.6}", report.max_drawdown)),
            ("total_trades", report.total_trades.to_string()),
            ("round_trips", report.round_trips.to_string()),
            ("trades_won", report.trades_won.to_string()),
            ("trades_lost", report.trades_lost.to_string()),
            ("win_rate", format!("{:.6}", report.win_rate)),
            ("profit_factor", format!("{:.6}", report.profit_factor)),
            ("evaluated_bars", report.evaluated_bars.to_string()),
            ("rejected_orders", report.rejected_orders.to_string()),
        ];

        wtr.write_record(["metric", "value"])
            .map_err(|e| report_error(path, e))?;
        for (metric, value) in rows {
            wtr.write_record([metric, value.as_str()])
                .map_err(|e| report_error(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_trades(result: &BacktestResult, path: &Path) -> Result<(), SigtraderError> {
        let mut wtr = Self::writer(path)?;
        wtr.write_record([
            "timestamp",
            "symbol",
            "side",
            "quantity",
            "price",
            "value",
            "cash_after",
        ])
        .map_err(|e| report_error(path, e))?;

        for trade in &result.ledger.trades {
            wtr.write_record([
                trade.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                trade.symbol.clone(),
                trade.side.to_string(),
                trade.quantity.to_string(),
                format!("{:.4}", trade.price),
                format!("{:.2}", trade.value()),
                format!("{:.2}", trade.cash_after),
            ])
            .map_err(|e| report_error(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_equity(result: &BacktestResult, path: &Path) -> Result<(), SigtraderError> {
        let mut wtr = Self::writer(path)?;
        wtr.write_record(["timestamp", "equity"])
            .map_err(|e| report_error(path, e))?;

        for point in &result.ledger.equity_curve {
            wtr.write_record([
                point.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                format!("{:.2}", point.equity),
            ])
            .map_err(|e| report_error(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn report_error(path: &Path, e: csv::Error) -> SigtraderError {
    SigtraderError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        report: &Report,
        result: &BacktestResult,
        output_path: &str,
    ) -> Result<(), SigtraderError> {
        let summary = Self::output_file(output_path, "summary");
        let trades = Self::output_file(output_path, "trades");
        let equity = Self::output_file(output_path, "equity");

        Self::write_summary(report, &summary)?;
        Self::write_trades(result, &trades)?;
        Self::write_equity(result, &equity)?;

        info!(
            summary = %summary.display(),
            trades = %trades.display(),
            equity = %equity.display(),
            "report written"
        );
        Ok(())
    }
}
