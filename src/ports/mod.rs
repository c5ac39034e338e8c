//! Port traits: the boundary between the decision core and its collaborators.

pub mod config_port;
pub mod data_port;
pub mod executor_port;
pub mod oracle_port;
pub mod report_port;
