//! sharpeopt: long-only maximum-Sharpe portfolio allocation.
//!
//! Hexagonal architecture: estimation and optimization in [`domain`], port
//! traits in [`ports`], concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;

pub use domain::pipeline::{optimize, OptimizeConfig};
