//! Quadratic subproblem for the SQP allocator.
//!
//! Solves
//!
//! ```text
//! min_d  ½ dᵀ B d + gᵀ d
//! s.t.   1ᵀ(w + d) = 1
//!        w_i + d_i ≥ 0
//! ```
//!
//! with a primal active-set method started from `d = 0`. `B` must be
//! positive definite. Upper bounds `w_i + d_i ≤ 1` follow from the two
//! constraints above and are not tracked.

use nalgebra::{DMatrix, DVector};

/// Weights at or below this are treated as sitting on their lower bound.
const BOUND_EPS: f64 = 1e-14;
/// A subproblem step below this (max-norm) counts as zero.
const STEP_EPS: f64 = 1e-13;
/// Multipliers above `-MULTIPLIER_EPS` are treated as non-negative.
const MULTIPLIER_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QpError {
    #[error("singular KKT system in quadratic subproblem")]
    Singular,
    #[error("quadratic subproblem did not settle within {0} iterations")]
    IterationLimit(usize),
    /// A just-released bound blocked the very next step with zero length.
    #[error("active set cycling on the bound of asset {0}")]
    Cycling(usize),
}

pub fn solve(
    hessian: &DMatrix<f64>,
    gradient: &DVector<f64>,
    weights: &DVector<f64>,
    max_iter: usize,
) -> Result<DVector<f64>, QpError> {
    let n = weights.len();
    let mut d = DVector::<f64>::zeros(n);
    let mut active: Vec<bool> = weights.iter().map(|&w| w <= BOUND_EPS).collect();
    let budget_residual = 1.0 - weights.sum();
    let mut released: Option<usize> = None;

    for _ in 0..max_iter {
        let free: Vec<usize> = (0..n).filter(|&i| !active[i]).collect();
        let m = free.len();
        if m == 0 {
            return Err(QpError::Singular);
        }

        let q = hessian * &d + gradient;

        let mut kkt = DMatrix::<f64>::zeros(m + 1, m + 1);
        let mut rhs = DVector::<f64>::zeros(m + 1);
        for (a, &i) in free.iter().enumerate() {
            for (b, &j) in free.iter().enumerate() {
                kkt[(a, b)] = hessian[(i, j)];
            }
            kkt[(a, m)] = 1.0;
            kkt[(m, a)] = 1.0;
            rhs[a] = -q[i];
        }
        rhs[m] = budget_residual - d.sum();

        let sol = kkt.lu().solve(&rhs).ok_or(QpError::Singular)?;
        if sol.iter().any(|v| !v.is_finite()) {
            return Err(QpError::Singular);
        }
        let nu = sol[m];

        let step_size = sol.rows(0, m).amax();
        if step_size <= STEP_EPS {
            // Stationary on the current face: release the bound with the most
            // negative multiplier, or stop if all are non-negative.
            let release = (0..n)
                .filter(|&i| active[i])
                .map(|i| (i, q[i] + nu))
                .filter(|&(_, lambda)| lambda < -MULTIPLIER_EPS)
                .min_by(|a, b| a.1.total_cmp(&b.1));
            match release {
                Some((i, _)) => {
                    active[i] = false;
                    released = Some(i);
                }
                None => return Ok(d),
            }
            continue;
        }

        let mut alpha = 1.0;
        let mut blocking = None;
        for (a, &i) in free.iter().enumerate() {
            let p = sol[a];
            if p < 0.0 {
                let ratio = ((weights[i] + d[i]).max(0.0)) / -p;
                if ratio < alpha {
                    alpha = ratio;
                    blocking = Some(i);
                }
            }
        }

        if alpha <= 0.0 {
            if let Some(i) = blocking.filter(|&i| released == Some(i)) {
                return Err(QpError::Cycling(i));
            }
        }
        released = None;

        for (a, &i) in free.iter().enumerate() {
            d[i] += alpha * sol[a];
        }
        if let Some(i) = blocking {
            d[i] = -weights[i];
            active[i] = true;
        }
    }

    Err(QpError::IterationLimit(max_iter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn interior_step_projects_gradient_onto_budget() {
        let w = DVector::from_vec(vec![0.5, 0.5]);
        let g = DVector::from_vec(vec![-0.1, 0.1]);
        let d = solve(&DMatrix::identity(2, 2), &g, &w, 50).unwrap();
        assert_relative_eq!(d[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(d[1], -0.1, epsilon = 1e-12);
        assert_relative_eq!(d.sum(), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn step_stops_at_lower_bound() {
        let w = DVector::from_vec(vec![0.5, 0.5]);
        let g = DVector::from_vec(vec![-5.0, 5.0]);
        let d = solve(&DMatrix::identity(2, 2), &g, &w, 50).unwrap();
        let next = &w + &d;
        assert_relative_eq!(next[0], 1.0, epsilon = 1e-12);
        assert_eq!(next[1], 0.0);
    }

    #[test]
    fn uniform_gradient_gives_zero_step() {
        let w = DVector::from_vec(vec![0.25, 0.25, 0.5]);
        let g = DVector::from_element(3, 0.7);
        let d = solve(&DMatrix::identity(3, 3), &g, &w, 50).unwrap();
        assert!(d.amax() < 1e-12);
    }

    #[test]
    fn releases_bound_with_negative_multiplier() {
        // Asset 0 starts at zero but its gradient pulls it back in.
        let w = DVector::from_vec(vec![0.0, 0.5, 0.5]);
        let g = DVector::from_vec(vec![-1.0, 0.0, 0.0]);
        let d = solve(&DMatrix::identity(3, 3), &g, &w, 50).unwrap();
        let next = &w + &d;
        assert!(next[0] > 0.0);
        assert_relative_eq!(next.sum(), 1.0, epsilon = 1e-12);
        assert!(next.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn keeps_bound_with_positive_multiplier() {
        let w = DVector::from_vec(vec![0.0, 0.5, 0.5]);
        let g = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        let d = solve(&DMatrix::identity(3, 3), &g, &w, 50).unwrap();
        assert_eq!(d[0], 0.0);
    }

    #[test]
    fn released_bound_blocking_immediately_is_cycling() {
        // Indefinite curvature drives the released weight straight back to zero.
        let w = DVector::from_vec(vec![1.0, 0.0]);
        let g = DVector::from_vec(vec![1.0, 0.0]);
        let b = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let err = solve(&b, &g, &w, 50).unwrap_err();
        assert_eq!(err, QpError::Cycling(1));
    }

    #[test]
    fn iteration_limit_is_reported() {
        let w = DVector::from_vec(vec![0.0, 0.5, 0.5]);
        let g = DVector::from_vec(vec![-1.0, 0.0, 0.0]);
        let err = solve(&DMatrix::identity(3, 3), &g, &w, 0).unwrap_err();
        assert_eq!(err, QpError::IterationLimit(0));
    }
}
