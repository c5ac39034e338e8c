//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_report_adapter;
pub mod file_config_adapter;
pub mod mock_data_adapter;
pub mod paper_executor;
pub mod static_oracles;
