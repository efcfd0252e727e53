//! Long-only, fully-invested maximum-Sharpe allocator.
//!
//! Sequential quadratic programming on `-sharpe(w)`:
//!
//! - start from equal weights `1/N`,
//! - each iteration solves the quadratic model in [`qp`] under
//!   `Σw_i = 1` and `0 ≤ w_i ≤ 1`,
//! - backtracks along the step until the Armijo condition holds,
//! - updates a damped BFGS approximation of the Hessian.
//!
//! Iterates never leave the feasible set and always have a finite objective:
//! when equal weights carry no risk, the run starts from the best vertex or
//! vertex/centre midpoint instead. When several weightings share the
//! optimum (for example two assets with identical estimates) the one returned
//! is whichever the iteration path reaches first; no tie-break is applied.

pub mod qp;

use crate::domain::error::PortfolioError;
use crate::domain::objective::SharpeObjective;
use nalgebra::{DMatrix, DVector};
use std::fmt;

pub const DEFAULT_TOLERANCE: f64 = 1e-9;
pub const DEFAULT_MAX_ITERATIONS: usize = 200;
pub const DEFAULT_FEASIBILITY_TOLERANCE: f64 = 1e-8;

const ARMIJO: f64 = 1e-4;
const MIN_STEP: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Single asset, solved without iterating.
    Trivial,
    Converged,
    IterationLimit,
    LineSearchFailed,
    SingularSubproblem,
    NonFiniteObjective,
    Infeasible,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolverStatus::Trivial => "trivial",
            SolverStatus::Converged => "converged",
            SolverStatus::IterationLimit => "iteration limit",
            SolverStatus::LineSearchFailed => "line search failed",
            SolverStatus::SingularSubproblem => "singular subproblem",
            SolverStatus::NonFiniteObjective => "non-finite objective",
            SolverStatus::Infeasible => "infeasible",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocatorConfig {
    /// Step and objective-change tolerance.
    pub tol: f64,
    pub max_iter: usize,
    /// Largest bound or budget violation that is clipped rather than rejected.
    pub feasibility_tol: f64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            tol: DEFAULT_TOLERANCE,
            max_iter: DEFAULT_MAX_ITERATIONS,
            feasibility_tol: DEFAULT_FEASIBILITY_TOLERANCE,
        }
    }
}

/// Solver output: weights in asset order plus diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub weights: Vec<f64>,
    pub status: SolverStatus,
    pub iterations: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Allocator {
    config: AllocatorConfig,
}

impl Allocator {
    pub fn new(config: AllocatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    pub fn allocate(&self, objective: &SharpeObjective) -> Result<Allocation, PortfolioError> {
        let n = objective.dimension();
        if n == 0 {
            return Err(PortfolioError::invalid(
                "allocator",
                "assets",
                "at least one asset is required",
            ));
        }
        if n == 1 {
            return Ok(Allocation {
                weights: vec![1.0],
                status: SolverStatus::Trivial,
                iterations: 0,
            });
        }

        let tol = self.config.tol;
        let qp_max_iter = 10 * n + 50;

        let equal = DVector::from_element(n, 1.0 / n as f64);
        let f_equal = objective.value(&equal);
        if f_equal.is_nan() {
            return Err(failure(
                SolverStatus::NonFiniteObjective,
                "objective is NaN at the equal-weight starting point",
                &equal,
                0,
            ));
        }
        let (mut w, mut f) = if f_equal.is_finite() {
            (equal, f_equal)
        } else {
            tracing::debug!("equal weights have zero volatility, choosing another start");
            finite_start(objective, &equal).ok_or_else(|| {
                failure(
                    SolverStatus::NonFiniteObjective,
                    "every candidate starting point has zero volatility",
                    &equal,
                    0,
                )
            })?
        };
        let mut g = objective.gradient(&w);
        let mut hessian = DMatrix::<f64>::identity(n, n);
        let mut hessian_reset = false;

        for iter in 1..=self.config.max_iter {
            let d = qp::solve(&hessian, &g, &w, qp_max_iter).map_err(|e| {
                let status = match e {
                    qp::QpError::Singular | qp::QpError::Cycling(_) => {
                        SolverStatus::SingularSubproblem
                    }
                    qp::QpError::IterationLimit(_) => SolverStatus::IterationLimit,
                };
                failure(status, &e.to_string(), &w, iter)
            })?;

            let step_norm = d.amax();
            tracing::debug!(iter, objective = f, step = step_norm, "sqp iteration");
            if step_norm <= tol {
                return self.finish(&w, iter);
            }

            let directional = g.dot(&d);
            let accepted = line_search(objective, &w, &d, f, directional);

            let Some((w_next, f_next)) = accepted else {
                if step_norm <= tol.sqrt() {
                    // No representable decrease left along a tiny step.
                    return self.finish(&w, iter);
                }
                if !hessian_reset {
                    tracing::debug!(iter, "line search failed, resetting Hessian approximation");
                    hessian = DMatrix::identity(n, n);
                    hessian_reset = true;
                    continue;
                }
                return Err(failure(
                    SolverStatus::LineSearchFailed,
                    "no sufficient decrease along the search direction",
                    &w,
                    iter,
                ));
            };
            hessian_reset = false;

            let g_next = objective.gradient(&w_next);
            let s = &w_next - &w;
            let y = &g_next - &g;
            damped_bfgs_update(&mut hessian, &s, &y);

            let change = (f - f_next).abs();
            let moved = s.amax();
            w = w_next;
            f = f_next;
            g = g_next;

            if change <= tol && moved <= tol.sqrt() {
                return self.finish(&w, iter);
            }
        }

        Err(failure(
            SolverStatus::IterationLimit,
            &format!("no convergence within {} iterations", self.config.max_iter),
            &w,
            self.config.max_iter,
        ))
    }

    /// Clips residual bound violations and renormalizes, unless the raw
    /// weights are further than `feasibility_tol` from feasible.
    fn finish(&self, raw: &DVector<f64>, iterations: usize) -> Result<Allocation, PortfolioError> {
        let tol = self.config.feasibility_tol;
        let budget_gap = (raw.sum() - 1.0).abs();
        let lowest = raw.min();
        let highest = raw.max();
        if !(lowest >= -tol && highest <= 1.0 + tol && budget_gap <= tol) {
            return Err(failure(
                SolverStatus::Infeasible,
                &format!(
                    "solver output outside tolerance (min {lowest:e}, max {highest:e}, budget gap {budget_gap:e})"
                ),
                raw,
                iterations,
            ));
        }

        let clipped: Vec<f64> = raw.iter().map(|&x| x.clamp(0.0, 1.0)).collect();
        let total: f64 = clipped.iter().sum();
        let weights = clipped.into_iter().map(|x| x / total).collect();

        Ok(Allocation {
            weights,
            status: SolverStatus::Converged,
            iterations,
        })
    }
}

/// Best finite objective among the vertices and the midpoints between each
/// vertex and `equal`.
fn finite_start(objective: &SharpeObjective, equal: &DVector<f64>) -> Option<(DVector<f64>, f64)> {
    let n = equal.len();
    let mut best: Option<(DVector<f64>, f64)> = None;
    for k in 0..n {
        let mut vertex = DVector::zeros(n);
        vertex[k] = 1.0;
        let midpoint = (&vertex + equal) * 0.5;
        for candidate in [vertex, midpoint] {
            let value = objective.value(&candidate);
            if value.is_finite() && best.as_ref().is_none_or(|(_, b)| value < *b) {
                best = Some((candidate, value));
            }
        }
    }
    best
}

fn failure(status: SolverStatus, message: &str, weights: &DVector<f64>, iterations: usize) -> PortfolioError {
    PortfolioError::OptimizationFailed {
        status,
        message: message.to_string(),
        weights: weights.iter().copied().collect(),
        iterations,
    }
}

/// Backtracking from the full step; non-finite trial values are rejected.
fn line_search(
    objective: &SharpeObjective,
    w: &DVector<f64>,
    d: &DVector<f64>,
    f: f64,
    directional: f64,
) -> Option<(DVector<f64>, f64)> {
    let mut alpha = 1.0;
    while alpha >= MIN_STEP {
        let trial = w + d * alpha;
        let value = objective.value(&trial);
        if value.is_finite() && value <= f + ARMIJO * alpha * directional {
            return Some((trial, value));
        }
        alpha *= 0.5;
    }
    None
}

/// Powell-damped BFGS update; keeps the approximation positive definite.
fn damped_bfgs_update(hessian: &mut DMatrix<f64>, s: &DVector<f64>, y: &DVector<f64>) {
    let bs = &*hessian * s;
    let sbs = s.dot(&bs);
    if sbs <= f64::MIN_POSITIVE {
        return;
    }
    let sy = s.dot(y);
    let theta = if sy >= 0.2 * sbs {
        1.0
    } else {
        0.8 * sbs / (sbs - sy)
    };
    let r = y * theta + &bs * (1.0 - theta);
    let sr = s.dot(&r);
    if sr <= f64::MIN_POSITIVE {
        return;
    }
    *hessian += (&r * r.transpose()) / sr - (&bs * bs.transpose()) / sbs;
}
