//! Configuration validation.
//!
//! `validate_optimizer_config` and `validate_data_config` check an INI-backed
//! [`ConfigPort`] before a run; `validate_parameters` checks the in-memory
//! values handed to [`optimize`](crate::domain::pipeline::optimize).

use crate::domain::error::PortfolioError;
use crate::domain::estimator::MAX_PERIODS_PER_YEAR;
use crate::domain::pipeline::OptimizeConfig;
use crate::domain::returns::ReturnKind;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_optimizer_config(config: &dyn ConfigPort) -> Result<(), PortfolioError> {
    validate_risk_free_rate(config)?;
    validate_periods_per_year(config)?;
    validate_return_kind(config)?;
    validate_positive(config, "tol")?;
    validate_positive(config, "feasibility_tol")?;
    validate_max_iter(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), PortfolioError> {
    validate_dates(config)?;
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(PortfolioError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

pub fn validate_parameters(
    risk_free_rate: f64,
    config: &OptimizeConfig,
) -> Result<(), PortfolioError> {
    if !risk_free_rate.is_finite() {
        return Err(PortfolioError::invalid(
            "optimizer",
            "risk_free_rate",
            format!("risk_free_rate must be finite, got {risk_free_rate}"),
        ));
    }
    let periods = config.estimator.periods_per_year;
    if periods == 0 || periods > MAX_PERIODS_PER_YEAR {
        return Err(PortfolioError::invalid(
            "optimizer",
            "periods_per_year",
            format!("periods_per_year must be between 1 and {MAX_PERIODS_PER_YEAR}"),
        ));
    }
    let allocator = &config.allocator;
    if !(allocator.tol.is_finite() && allocator.tol > 0.0) {
        return Err(PortfolioError::invalid("optimizer", "tol", "tol must be positive"));
    }
    if !(allocator.feasibility_tol.is_finite() && allocator.feasibility_tol > 0.0) {
        return Err(PortfolioError::invalid(
            "optimizer",
            "feasibility_tol",
            "feasibility_tol must be positive",
        ));
    }
    if allocator.max_iter == 0 {
        return Err(PortfolioError::invalid(
            "optimizer",
            "max_iter",
            "max_iter must be at least 1",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), PortfolioError> {
    let Some(raw) = config.get_string("optimizer", "risk_free_rate") else {
        return Ok(());
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(()),
        _ => Err(PortfolioError::invalid(
            "optimizer",
            "risk_free_rate",
            "risk_free_rate must be a finite number",
        )),
    }
}

fn validate_periods_per_year(config: &dyn ConfigPort) -> Result<(), PortfolioError> {
    let Some(raw) = config.get_string("optimizer", "periods_per_year") else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v > 0 && v <= i64::from(MAX_PERIODS_PER_YEAR) => Ok(()),
        _ => Err(PortfolioError::invalid(
            "optimizer",
            "periods_per_year",
            "periods_per_year must be a positive integer",
        )),
    }
}

fn validate_return_kind(config: &dyn ConfigPort) -> Result<(), PortfolioError> {
    match config.get_string("optimizer", "return_kind") {
        None => Ok(()),
        Some(s) => s
            .parse::<ReturnKind>()
            .map(|_| ())
            .map_err(|reason| PortfolioError::invalid("optimizer", "return_kind", reason)),
    }
}

fn validate_positive(config: &dyn ConfigPort, key: &str) -> Result<(), PortfolioError> {
    let Some(raw) = config.get_string("optimizer", key) else {
        return Ok(());
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(()),
        _ => Err(PortfolioError::invalid(
            "optimizer",
            key,
            format!("{key} must be a positive number"),
        )),
    }
}

fn validate_max_iter(config: &dyn ConfigPort) -> Result<(), PortfolioError> {
    let Some(raw) = config.get_string("optimizer", "max_iter") else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v >= 1 => Ok(()),
        _ => Err(PortfolioError::invalid(
            "optimizer",
            "max_iter",
            "max_iter must be at least 1",
        )),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), PortfolioError> {
    let start = parse_date(config.get_string("data", "start_date").as_deref(), "start_date")?;
    let end = parse_date(config.get_string("data", "end_date").as_deref(), "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(PortfolioError::invalid(
                "data",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

/// Dates are optional; when present they must be `YYYY-MM-DD`.
pub fn parse_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, PortfolioError> {
    match value {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                PortfolioError::invalid(
                    "data",
                    field,
                    format!("invalid {field} format, expected YYYY-MM-DD"),
                )
            }),
    }
}
