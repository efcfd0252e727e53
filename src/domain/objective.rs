//! Sharpe ratio objective.
//!
//! [`sharpe`] is the pure statistic. [`SharpeObjective`] binds the estimates
//! and risk-free rate once so the allocator can evaluate `-sharpe` and its
//! gradient without reaching back into the estimators.

use nalgebra::{DMatrix, DVector};

/// Return, volatility and Sharpe ratio of one weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioStats {
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

/// `wᵀμ`, `sqrt(max(wᵀΣw, 0))` and `(wᵀμ - r_f) / σ`.
///
/// Zero volatility yields `-inf` for a positive excess return, `+inf` for a
/// negative one and `0` when the excess is exactly zero.
pub fn sharpe(
    weights: &DVector<f64>,
    expected_returns: &DVector<f64>,
    covariance: &DMatrix<f64>,
    risk_free_rate: f64,
) -> PortfolioStats {
    let expected_return = weights.dot(expected_returns);
    let variance = weights.dot(&(covariance * weights)).max(0.0);
    let volatility = variance.sqrt();
    let excess = expected_return - risk_free_rate;

    let sharpe_ratio = if volatility > 0.0 {
        excess / volatility
    } else if excess > 0.0 {
        f64::NEG_INFINITY
    } else if excess < 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    PortfolioStats {
        expected_return,
        volatility,
        sharpe_ratio,
    }
}

/// Negated Sharpe ratio bound to a fixed set of estimates.
#[derive(Debug, Clone)]
pub struct SharpeObjective {
    pub expected_returns: DVector<f64>,
    pub covariance: DMatrix<f64>,
    pub risk_free_rate: f64,
}

impl SharpeObjective {
    pub fn new(expected_returns: DVector<f64>, covariance: DMatrix<f64>, risk_free_rate: f64) -> Self {
        Self {
            expected_returns,
            covariance,
            risk_free_rate,
        }
    }

    pub fn dimension(&self) -> usize {
        self.expected_returns.len()
    }

    pub fn stats(&self, weights: &DVector<f64>) -> PortfolioStats {
        sharpe(
            weights,
            &self.expected_returns,
            &self.covariance,
            self.risk_free_rate,
        )
    }

    /// `-sharpe(w)`, the quantity the allocator minimizes.
    pub fn value(&self, weights: &DVector<f64>) -> f64 {
        -self.stats(weights).sharpe_ratio
    }

    /// Gradient of `-sharpe(w)`:
    /// `-(μ / σ - (wᵀμ - r_f) Σw / σ³)`, or zero where `σ = 0`.
    pub fn gradient(&self, weights: &DVector<f64>) -> DVector<f64> {
        let cov_w = &self.covariance * weights;
        let variance = weights.dot(&cov_w).max(0.0);
        if variance <= 0.0 {
            return DVector::zeros(weights.len());
        }
        let volatility = variance.sqrt();
        let excess = weights.dot(&self.expected_returns) - self.risk_free_rate;
        let d_sharpe = &self.expected_returns / volatility - cov_w * (excess / (variance * volatility));
        -d_sharpe
    }
}
