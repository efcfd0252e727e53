//! Port traits the domain uses to reach data, configuration and presentation.

pub mod config_port;
pub mod data_port;
pub mod report_port;
