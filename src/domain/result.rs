//! Final report structure for one optimization run.

use crate::domain::allocator::{Allocation, SolverStatus};
use crate::domain::estimator::EstimateSet;
use crate::domain::objective::{sharpe, PortfolioStats};
use nalgebra::DVector;

#[derive(Debug, Clone, PartialEq)]
pub struct AssetWeight {
    pub asset: String,
    pub weight: f64,
    pub expected_return: f64,
}

/// Weights, portfolio statistics and the estimates they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    weights: Vec<f64>,
    stats: PortfolioStats,
    estimates: EstimateSet,
    risk_free_rate: f64,
    status: SolverStatus,
    iterations: usize,
}

impl OptimizationResult {
    pub fn assemble(estimates: EstimateSet, allocation: Allocation, risk_free_rate: f64) -> Self {
        let stats = sharpe(
            &DVector::from_column_slice(&allocation.weights),
            estimates.expected_returns(),
            estimates.covariance(),
            risk_free_rate,
        );
        Self {
            weights: allocation.weights,
            stats,
            estimates,
            risk_free_rate,
            status: allocation.status,
            iterations: allocation.iterations,
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn stats(&self) -> &PortfolioStats {
        &self.stats
    }

    pub fn estimates(&self) -> &EstimateSet {
        &self.estimates
    }

    pub fn assets(&self) -> &[String] {
        self.estimates.assets()
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    pub fn status(&self) -> SolverStatus {
        self.status
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn weight_of(&self, asset: &str) -> Option<f64> {
        self.assets()
            .iter()
            .position(|a| a == asset)
            .map(|i| self.weights[i])
    }

    pub fn asset_weights(&self) -> Vec<AssetWeight> {
        self.assets()
            .iter()
            .zip(&self.weights)
            .enumerate()
            .map(|(i, (asset, &weight))| AssetWeight {
                asset: asset.clone(),
                weight,
                expected_return: self.estimates.expected_returns()[i],
            })
            .collect()
    }
}
