//! Least-squares fit of `y = A * exp(-k * x)` by Levenberg–Marquardt.

use crate::error::{LifecycleError, Result};

const MAX_ITERATIONS: u32 = 500;
const MAX_DAMPING: f64 = 1.0e16;
const STEP_TOLERANCE: f64 = 1.0e-12;
const COST_TOLERANCE: f64 = 1.0e-15;
/// Bound on |g| / sqrt(h * cost), the cosine between residual and Jacobian column.
const GRADIENT_TOLERANCE: f64 = 1.0e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpDecayFit {
    pub amplitude: f64,
    pub rate: f64,
    pub residual_sum_sq: f64,
    pub iterations: u32,
}

impl ExpDecayFit {
    pub fn eval(&self, x: f64) -> f64 {
        self.amplitude * (-self.rate * x).exp()
    }

    /// x at which the curve equals `level`, if it ever does.
    pub fn solve_for(&self, level: f64) -> Option<f64> {
        if self.amplitude <= 0.0 || level <= 0.0 || self.rate == 0.0 {
            return None;
        }
        let x = -(level / self.amplitude).ln() / self.rate;
        x.is_finite().then_some(x)
    }
}

/// True when neither parameter direction can still explain part of the residual.
fn is_stationary(g_a: f64, g_k: f64, h_aa: f64, h_kk: f64, cost: f64) -> bool {
    g_a.abs() <= GRADIENT_TOLERANCE * (h_aa * cost).sqrt()
        && g_k.abs() <= GRADIENT_TOLERANCE * (h_kk * cost).sqrt()
}

fn sum_sq(xs: &[f64], ys: &[f64], amplitude: f64, rate: f64) -> f64 {
    xs.iter()
        .zip(ys)
        .map(|(x, y)| {
            let r = y - amplitude * (-rate * x).exp();
            r * r
        })
        .sum()
}

/// Fit `A * exp(-k x)` to the points, starting from `(a0, k0)`.
pub fn fit_exp_decay(xs: &[f64], ys: &[f64], a0: f64, k0: f64) -> Result<ExpDecayFit> {
    if xs.len() != ys.len() {
        return Err(LifecycleError::Solver(format!(
            "curve fit needs aligned data, got {} x and {} y values",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(LifecycleError::Solver(format!(
            "curve fit needs at least 2 points for 2 parameters, got {}",
            xs.len()
        )));
    }
    if xs.iter().chain(ys).any(|v| !v.is_finite()) || !a0.is_finite() || !k0.is_finite() {
        return Err(LifecycleError::Solver("curve fit input is not finite".to_string()));
    }

    let (mut a, mut k) = (a0, k0);
    let mut cost = sum_sq(xs, ys, a, k);
    if !cost.is_finite() {
        return Err(LifecycleError::Solver(format!(
            "curve fit initial guess overflows (A={a}, k={k})"
        )));
    }
    let mut damping = 1.0e-3;

    for iteration in 1..=MAX_ITERATIONS {
        // Normal equations J^T J and J^T r for the two parameters.
        let (mut h_aa, mut h_ak, mut h_kk, mut g_a, mut g_k) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (x, y) in xs.iter().zip(ys) {
            let e = (-k * x).exp();
            let r = y - a * e;
            let j_a = e;
            let j_k = -a * x * e;
            h_aa += j_a * j_a;
            h_ak += j_a * j_k;
            h_kk += j_k * j_k;
            g_a += j_a * r;
            g_k += j_k * r;
        }

        loop {
            let d_aa = h_aa + damping * h_aa.max(f64::EPSILON);
            let d_kk = h_kk + damping * h_kk.max(f64::EPSILON);
            let det = d_aa * d_kk - h_ak * h_ak;
            if !det.is_finite() || det.abs() < f64::MIN_POSITIVE {
                return Err(LifecycleError::Solver(
                    "curve fit is degenerate (singular normal equations)".to_string(),
                ));
            }
            let step_a = (d_kk * g_a - h_ak * g_k) / det;
            let step_k = (d_aa * g_k - h_ak * g_a) / det;
            let (next_a, next_k) = (a + step_a, k + step_k);
            let next_cost = sum_sq(xs, ys, next_a, next_k);

            if next_cost.is_finite() && next_cost < cost {
                let improvement = cost - next_cost;
                let step = step_a.abs() / (a.abs() + STEP_TOLERANCE)
                    + step_k.abs() / (k.abs() + STEP_TOLERANCE);
                a = next_a;
                k = next_k;
                cost = next_cost;
                damping = (damping / 10.0).max(1.0e-12);
                if step < STEP_TOLERANCE || improvement <= COST_TOLERANCE * cost.max(1.0) {
                    return Ok(ExpDecayFit {
                        amplitude: a,
                        rate: k,
                        residual_sum_sq: cost,
                        iterations: iteration,
                    });
                }
                break;
            }

            damping *= 10.0;
            if damping > MAX_DAMPING {
                if !is_stationary(g_a, g_k, h_aa, h_kk, cost) {
                    return Err(LifecycleError::Solver(format!(
                        "curve fit stalled away from a minimum (A={a}, k={k}, gradient=({g_a}, {g_k}))"
                    )));
                }
                return Ok(ExpDecayFit {
                    amplitude: a,
                    rate: k,
                    residual_sum_sq: cost,
                    iterations: iteration,
                });
            }
        }
    }

    Err(LifecycleError::Solver(format!(
        "curve fit did not converge after {MAX_ITERATIONS} iterations (A={a}, k={k})"
    )))
}
