//! End-to-end optimization: prices → returns → estimates → weights → result.

use crate::domain::allocator::{Allocator, AllocatorConfig};
use crate::domain::config_validation::validate_parameters;
use crate::domain::error::PortfolioError;
use crate::domain::estimator::{self, EstimatorConfig};
use crate::domain::objective::SharpeObjective;
use crate::domain::price_series::{align, PriceSeries, MIN_PRICE_OBSERVATIONS};
use crate::domain::result::OptimizationResult;
use crate::domain::returns::{compute_returns, ReturnKind};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OptimizeConfig {
    pub estimator: EstimatorConfig,
    pub return_kind: ReturnKind,
    pub allocator: AllocatorConfig,
}

impl OptimizeConfig {
    pub fn with_periods_per_year(periods_per_year: u32) -> Self {
        Self {
            estimator: EstimatorConfig { periods_per_year },
            ..Self::default()
        }
    }
}

/// Computes the long-only maximum-Sharpe portfolio for the given price histories.
///
/// Series are inner-joined on their common dates; asset order in the result
/// follows the input order. Errors from any stage are returned unchanged.
pub fn optimize(
    series: &[PriceSeries],
    risk_free_rate: f64,
    config: &OptimizeConfig,
) -> Result<OptimizationResult, PortfolioError> {
    validate_parameters(risk_free_rate, config)?;

    let aligned = align(series)?;
    let short: Vec<&PriceSeries> = aligned
        .iter()
        .filter(|s| s.len() < MIN_PRICE_OBSERVATIONS)
        .collect();
    if !short.is_empty() {
        return Err(PortfolioError::InsufficientData {
            assets: short.iter().map(|s| s.asset.clone()).collect(),
            observations: short.iter().map(|s| s.len()).min().unwrap_or(0),
            minimum: MIN_PRICE_OBSERVATIONS,
        });
    }
    tracing::debug!(
        assets = aligned.len(),
        observations = aligned[0].len(),
        "aligned price series"
    );

    let returns = compute_returns(&aligned, config.return_kind);
    let estimates = estimator::estimate(&returns, &config.estimator)?;

    let objective = SharpeObjective::new(
        estimates.expected_returns().clone(),
        estimates.covariance().clone(),
        risk_free_rate,
    );
    let allocation = Allocator::new(config.allocator).allocate(&objective)?;
    tracing::debug!(
        status = %allocation.status,
        iterations = allocation.iterations,
        "allocation finished"
    );

    Ok(OptimizationResult::assemble(
        estimates,
        allocation,
        risk_free_rate,
    ))
}
