//! Annualized expected-return and covariance estimation.
//!
//! Both estimators take the same aligned [`ReturnSeries`] slice and an explicit
//! [`EstimatorConfig`]; nothing here reads process-wide state.
//!
//! Covariance uses the sample convention (ddof = 1): the sum of centred
//! cross-products is divided by `T - 1`, then scaled by `periods_per_year`.

use crate::domain::error::PortfolioError;
use crate::domain::returns::{ReturnKind, ReturnSeries};
use nalgebra::{DMatrix, DVector};

pub const DEFAULT_PERIODS_PER_YEAR: u32 = 252;

/// Minimum return observations per asset for the ddof = 1 estimators.
/// Largest `periods_per_year` accepted; compounding exponents are `i32`.
pub const MAX_PERIODS_PER_YEAR: u32 = i32::MAX as u32;
pub const MIN_RETURN_OBSERVATIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    pub periods_per_year: u32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
        }
    }
}

/// Annualized expected returns and covariance over one asset ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateSet {
    assets: Vec<String>,
    expected_returns: DVector<f64>,
    covariance: DMatrix<f64>,
}

impl EstimateSet {
    /// Fails with `ConfigInvalid` when the dimensions disagree.
    pub fn new(
        assets: Vec<String>,
        expected_returns: DVector<f64>,
        covariance: DMatrix<f64>,
    ) -> Result<Self, PortfolioError> {
        let n = assets.len();
        if expected_returns.len() != n || covariance.nrows() != n || covariance.ncols() != n {
            return Err(PortfolioError::invalid(
                "estimates",
                "dimension",
                format!(
                    "{} assets, {} returns, {}x{} covariance",
                    n,
                    expected_returns.len(),
                    covariance.nrows(),
                    covariance.ncols()
                ),
            ));
        }
        Ok(Self {
            assets,
            expected_returns,
            covariance,
        })
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn expected_returns(&self) -> &DVector<f64> {
        &self.expected_returns
    }

    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn expected_return_of(&self, asset: &str) -> Option<f64> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|i| self.expected_returns[i])
    }
}

fn check_sufficient(returns: &[ReturnSeries]) -> Result<(), PortfolioError> {
    let short: Vec<&ReturnSeries> = returns
        .iter()
        .filter(|r| r.len() < MIN_RETURN_OBSERVATIONS)
        .collect();
    if short.is_empty() {
        return Ok(());
    }
    Err(PortfolioError::InsufficientData {
        assets: short.iter().map(|r| r.asset.clone()).collect(),
        observations: short.iter().map(|r| r.len()).min().unwrap_or(0),
        minimum: MIN_RETURN_OBSERVATIONS,
    })
}

/// `(1 + mean)^P - 1` for simple returns, `exp(mean * P) - 1` for log returns.
pub fn annualize_mean(mean: f64, kind: ReturnKind, periods_per_year: u32) -> f64 {
    match kind {
        ReturnKind::Simple => match i32::try_from(periods_per_year) {
            Ok(p) => (1.0 + mean).powi(p) - 1.0,
            Err(_) => (1.0 + mean).powf(periods_per_year as f64) - 1.0,
        },
        ReturnKind::Log => (mean * periods_per_year as f64).exp_m1(),
    }
}

pub fn annualized_returns(
    returns: &[ReturnSeries],
    config: &EstimatorConfig,
) -> Result<DVector<f64>, PortfolioError> {
    check_sufficient(returns)?;
    Ok(DVector::from_iterator(
        returns.len(),
        returns
            .iter()
            .map(|r| annualize_mean(r.mean(), r.kind, config.periods_per_year)),
    ))
}

/// Sample covariance (ddof = 1) scaled by `periods_per_year`.
///
/// The upper triangle is accumulated once and mirrored, so the result is
/// exactly symmetric. Rank-deficient results are returned as-is.
pub fn annualized_covariance(
    returns: &[ReturnSeries],
    config: &EstimatorConfig,
) -> Result<DMatrix<f64>, PortfolioError> {
    check_sufficient(returns)?;
    if returns.is_empty() {
        return Err(PortfolioError::data_source("*", "no return series supplied"));
    }

    let n = returns.len();
    let t = returns.iter().map(|r| r.len()).min().unwrap_or(0);
    if returns.iter().any(|r| r.len() != t) {
        return Err(PortfolioError::data_source(
            "*",
            "return series are not aligned to a common length",
        ));
    }

    let means: Vec<f64> = returns.iter().map(|r| r.mean()).collect();
    let mut cov = DMatrix::<f64>::zeros(n, n);
    let mut centred = vec![0.0; n];
    for k in 0..t {
        for (i, r) in returns.iter().enumerate() {
            centred[i] = r.values[k] - means[i];
        }
        for i in 0..n {
            for j in i..n {
                cov[(i, j)] += centred[i] * centred[j];
            }
        }
    }

    let scale = config.periods_per_year as f64 / (t - 1) as f64;
    for i in 0..n {
        for j in i..n {
            let v = cov[(i, j)] * scale;
            cov[(i, j)] = v;
            cov[(j, i)] = v;
        }
    }
    Ok(cov)
}

pub fn estimate(
    returns: &[ReturnSeries],
    config: &EstimatorConfig,
) -> Result<EstimateSet, PortfolioError> {
    let expected_returns = annualized_returns(returns, config)?;
    let covariance = annualized_covariance(returns, config)?;
    EstimateSet::new(
        returns.iter().map(|r| r.asset.clone()).collect(),
        expected_returns,
        covariance,
    )
}
