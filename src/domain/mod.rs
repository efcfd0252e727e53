//! Core domain types and logic.

pub mod price_series;
pub mod returns;
pub mod estimator;
pub mod objective;
pub mod allocator;
pub mod result;
pub mod pipeline;
pub mod universe;
pub mod config_validation;
pub mod error;
