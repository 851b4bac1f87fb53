//! Least-squares fitting of the noise-response models.
//!
//! Linear and quadratic models are linear in their parameters and are solved
//! directly from the design matrix with an SVD. The exponential model is fit
//! with scaled Levenberg-Marquardt, started both from a grid search over the
//! decay rate and from a configurable guess.
//!
//! ```text
//! minimize  Σ (y_i - f(x_i; p))^2
//! ```

use nalgebra::{DMatrix, DVector, Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{ZneError, ZneResult};
use crate::model::ZneModel;

/// Relative tolerance on cost reduction and step size, matching MINPACK's
/// default of `sqrt(machine epsilon)`.
const TOLERANCE: f64 = 1.490_116_119_384_765_6e-8;

/// Damping bounds for Levenberg-Marquardt.
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e16;

/// Decay-rate grid for seeding the exponential fit: `2 * SEED_STEPS` rates
/// with `|b| * (x_max - x_min)` up to `SEED_RATE`.
const SEED_STEPS: i32 = 100;
const SEED_RATE: f64 = 8.0;

/// Options that affect how a model is calibrated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    /// Maximum number of model-cost evaluations for the exponential fit.
    pub max_evaluations: usize,
    /// Starting point `(a, b, c)` for the exponential fit.
    pub exponential_guess: [f64; 3],
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_evaluations: 5000,
            exponential_guess: [1.0, 0.1, 0.0],
        }
    }
}

impl FitOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the evaluation budget.
    #[must_use]
    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = max_evaluations;
        self
    }

    /// Set the exponential starting point.
    #[must_use]
    pub fn with_exponential_guess(mut self, guess: [f64; 3]) -> Self {
        self.exponential_guess = guess;
        self
    }
}

/// Fitted parameters plus the work it took to get them.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    /// Parameters in the order of [`ZneModel::evaluate`].
    pub params: Vec<f64>,
    /// Number of cost evaluations (1 for closed-form fits).
    pub evaluations: usize,
}

/// Fit `model` to the points `(xs[i], ys[i])`.
pub fn fit(model: ZneModel, xs: &[f64], ys: &[f64], options: &FitOptions) -> ZneResult<FitOutcome> {
    validate(model, xs, ys)?;

    match model {
        ZneModel::Linear => fit_polynomial(model, xs, ys, 1),
        ZneModel::Quadratic => fit_polynomial(model, xs, ys, 2),
        ZneModel::Exponential => fit_exponential(xs, ys, options),
    }
}

fn validate(model: ZneModel, xs: &[f64], ys: &[f64]) -> ZneResult<()> {
    if xs.len() != ys.len() {
        return Err(ZneError::LengthMismatch {
            scales: xs.len(),
            values: ys.len(),
        });
    }
    if xs.len() < model.num_params() {
        return Err(ZneError::InsufficientData {
            model: model.label(),
            required: model.num_params(),
            got: xs.len(),
        });
    }
    if let Some(index) = xs.iter().position(|x| !x.is_finite()) {
        return Err(ZneError::NonFinite {
            what: "noise scale",
            index,
        });
    }
    if let Some(index) = ys.iter().position(|y| !y.is_finite()) {
        return Err(ZneError::NonFinite {
            what: "measured value",
            index,
        });
    }
    Ok(())
}

/// Ordinary least squares on the design matrix `[x^d, ..., x, 1]`.
#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
fn fit_polynomial(model: ZneModel, xs: &[f64], ys: &[f64], degree: usize) -> ZneResult<FitOutcome> {
    let n = xs.len();
    let cols = degree + 1;

    let design = DMatrix::from_fn(n, cols, |row, col| xs[row].powi((degree - col) as i32));
    let rhs = DVector::from_column_slice(ys);

    let svd = design.svd(true, true);
    let max_sv = svd.singular_values.max();
    let eps = max_sv * f64::EPSILON * n.max(cols) as f64;
    if max_sv == 0.0 || svd.rank(eps) < cols {
        return Err(ZneError::Singular(model.label()));
    }

    let beta = svd
        .solve(&rhs, eps)
        .map_err(|_| ZneError::Singular(model.label()))?;
    if beta.iter().any(|v| !v.is_finite()) {
        return Err(ZneError::Singular(model.label()));
    }

    debug!(model = %model, params = ?beta.as_slice(), "polynomial fit complete");
    Ok(FitOutcome {
        params: beta.iter().copied().collect(),
        evaluations: 1,
    })
}

fn exp_cost(xs: &[f64], ys: &[f64], p: &Vector3<f64>) -> f64 {
    xs.iter()
        .zip(ys)
        .map(|(&x, &y)| {
            let r = y - (p[0] * (-p[1] * x).exp() + p[2]);
            r * r
        })
        .sum()
}

/// Normal equations `JᵀJ` and `Jᵀr` of `a*exp(-b*x) + c` at `p`.
fn exp_normal_equations(xs: &[f64], ys: &[f64], p: &Vector3<f64>) -> (Matrix3<f64>, Vector3<f64>) {
    let mut jtj = Matrix3::zeros();
    let mut jtr = Vector3::zeros();
    for (&x, &y) in xs.iter().zip(ys) {
        let e = (-p[1] * x).exp();
        let row = Vector3::new(e, -p[0] * x * e, 1.0);
        let r = y - (p[0] * e + p[2]);
        jtj += row * row.transpose();
        jtr += row * r;
    }
    (jtj, jtr)
}

/// A converged Levenberg-Marquardt run.
#[derive(Debug, Clone, Copy)]
struct ExpRun {
    params: Vector3<f64>,
    cost: f64,
}

/// Fit `a*exp(-b*x) + c`.
///
/// Two Levenberg-Marquardt runs compete: one from a grid-searched start where
/// `a` and `c` are solved in closed form for each decay rate, and one from
/// [`FitOptions::exponential_guess`]. The guess wins ties. Runs that stall or
/// collapse the exponential term to nothing are discarded, and the fit fails
/// with [`ZneError::NotConverged`] if neither survives. Every cost evaluation,
/// grid points included, counts against the budget.
#[allow(clippy::cast_sign_loss)]
fn fit_exponential(xs: &[f64], ys: &[f64], options: &FitOptions) -> ZneResult<FitOutcome> {
    let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if x_max - x_min <= 0.0 {
        return Err(ZneError::Singular(ZneModel::Exponential.label()));
    }

    let budget = options.max_evaluations;
    let mut evaluations = 0;
    let mut best: Option<ExpRun> = None;

    if budget > 2 * SEED_STEPS as usize {
        if let Some(seed) = separable_seed(xs, ys, x_min, x_max - x_min, &mut evaluations) {
            best = levenberg_marquardt(xs, ys, seed, budget, &mut evaluations)
                .filter(|run| !is_degenerate(xs, run));
            trace!(seed = ?seed.as_slice(), cost = ?best.map(|r| r.cost), "seeded run");
        }
    }

    let guess = Vector3::from(options.exponential_guess);
    if let Some(run) = levenberg_marquardt(xs, ys, guess, budget, &mut evaluations)
        .filter(|run| !is_degenerate(xs, run))
    {
        trace!(cost = run.cost, "guess run");
        if best.is_none_or(|b| run.cost <= b.cost * (1.0 + 1e-9)) {
            best = Some(run);
        }
    }

    let Some(run) = best else {
        return Err(ZneError::NotConverged {
            model: ZneModel::Exponential.label(),
            evaluations,
        });
    };

    debug!(
        params = ?run.params.as_slice(),
        cost = run.cost,
        evaluations,
        "exponential fit complete"
    );
    Ok(FitOutcome {
        params: run.params.iter().copied().collect(),
        evaluations,
    })
}

/// Best start on a grid of decay rates, with `a` and `c` from linear least
/// squares at each rate.
fn separable_seed(
    xs: &[f64],
    ys: &[f64],
    x_min: f64,
    span: f64,
    evaluations: &mut usize,
) -> Option<Vector3<f64>> {
    #[allow(clippy::cast_precision_loss)]
    let n = xs.len() as f64;
    let sum_y: f64 = ys.iter().sum();
    let mut best: Option<(f64, Vector3<f64>)> = None;

    for k in (-SEED_STEPS..=SEED_STEPS).filter(|&k| k != 0) {
        let b = SEED_RATE * f64::from(k) / f64::from(SEED_STEPS) / span;
        // Shifted to x_min so the basis stays in range for steep rates.
        let (mut see, mut se, mut sey) = (0.0, 0.0, 0.0);
        for (&x, &y) in xs.iter().zip(ys) {
            let e = (-b * (x - x_min)).exp();
            see += e * e;
            se += e;
            sey += e * y;
        }
        *evaluations += 1;

        let det = n * see - se * se;
        if det.is_nan() || det <= 1e-12 * n * see {
            continue;
        }
        let a = (n * sey - se * sum_y) / det * (b * x_min).exp();
        let c = (see * sum_y - se * sey) / det;
        let p = Vector3::new(a, b, c);
        let cost = exp_cost(xs, ys, &p);
        if cost.is_finite() && best.is_none_or(|(best_cost, _)| cost < best_cost) {
            best = Some((cost, p));
        }
    }
    best.map(|(_, p)| p)
}

/// Levenberg-Marquardt with Marquardt's running-max diagonal scaling and
/// Nielsen's damping update.
///
/// Returns `None` when the budget runs out or the damping saturates before
/// the gradient, cost reduction or step size meets [`TOLERANCE`].
fn levenberg_marquardt(
    xs: &[f64],
    ys: &[f64],
    start: Vector3<f64>,
    budget: usize,
    evaluations: &mut usize,
) -> Option<ExpRun> {
    if *evaluations >= budget {
        return None;
    }
    let mut p = start;
    let mut cost = exp_cost(xs, ys, &p);
    *evaluations += 1;
    if !cost.is_finite() {
        return None;
    }

    let (mut jtj, mut jtr) = exp_normal_equations(xs, ys, &p);
    let mut scale = jtj.diagonal().map(|d| d.max(f64::MIN_POSITIVE));
    let mut lambda = LAMBDA_INIT;
    let mut nu = 2.0;

    loop {
        if cost == 0.0 || gradient_vanishes(&jtj, &jtr, cost) {
            return Some(ExpRun { params: p, cost });
        }
        if *evaluations >= budget {
            return None;
        }

        let damped = jtj + Matrix3::from_diagonal(&(scale * lambda));
        let Some(delta) = damped.cholesky().map(|c| c.solve(&jtr)) else {
            lambda *= nu;
            nu *= 2.0;
            if lambda > LAMBDA_MAX {
                return None;
            }
            continue;
        };

        let trial = p + delta;
        let trial_cost = exp_cost(xs, ys, &trial);
        *evaluations += 1;
        let predicted = delta.dot(&(jtr + scale.component_mul(&delta) * lambda));
        let small_step = delta.norm() <= TOLERANCE * (p.norm() + TOLERANCE);

        if trial_cost.is_finite() && trial_cost < cost && predicted > 0.0 {
            let rho = (cost - trial_cost) / predicted;
            let reduction = (cost - trial_cost) / cost;
            let predicted_reduction = predicted / cost;
            trace!(evaluations = *evaluations, cost = trial_cost, lambda, rho, "accepted step");

            p = trial;
            cost = trial_cost;
            (jtj, jtr) = exp_normal_equations(xs, ys, &p);
            scale = scale.zip_map(&jtj.diagonal(), f64::max);
            lambda = (lambda * (1.0 - (2.0 * rho - 1.0).powi(3)).max(1.0 / 3.0)).max(f64::EPSILON);
            nu = 2.0;

            if small_step || (reduction <= TOLERANCE && predicted_reduction <= TOLERANCE) {
                return Some(ExpRun { params: p, cost });
            }
        } else {
            if small_step && predicted <= TOLERANCE * cost {
                return Some(ExpRun { params: p, cost });
            }
            lambda *= nu;
            nu *= 2.0;
            if lambda > LAMBDA_MAX {
                return None;
            }
        }
    }
}

/// Scaled gradient test: every column of `J` is nearly orthogonal to the
/// residual.
fn gradient_vanishes(jtj: &Matrix3<f64>, jtr: &Vector3<f64>, cost: f64) -> bool {
    let residual_norm = cost.sqrt();
    (0..3).all(|i| {
        let column_norm = jtj[(i, i)].sqrt();
        column_norm == 0.0 || jtr[i].abs() <= TOLERANCE * column_norm * residual_norm
    })
}

/// Whether the exponential term is lost below rounding of the offset, or the
/// parameters overflowed.
fn is_degenerate(xs: &[f64], run: &ExpRun) -> bool {
    let p = run.params;
    if p.iter().any(|v| !v.is_finite()) {
        return true;
    }
    let term = xs
        .iter()
        .map(|&x| (p[0] * (-p[1] * x).exp()).abs())
        .fold(0.0, f64::max);
    term <= f64::EPSILON * p[2].abs().max(1.0)
}

/// Coefficient of determination of a fit.
///
/// Returns 1.0 when the measured values have no variance.
#[allow(clippy::cast_precision_loss)]
pub fn r_squared(model: ZneModel, params: &[f64], xs: &[f64], ys: &[f64]) -> f64 {
    if ys.is_empty() {
        return 1.0;
    }
    let mean = ys.iter().sum::<f64>() / ys.len() as f64;
    let ss_tot: f64 = ys.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| (y - model.evaluate(x, params)).powi(2))
        .sum();

    if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_linear_exact() {
        let xs = [1.0, 2.0, 3.0];
        let ys = [1.0, 0.9, 0.8];
        let out = fit(ZneModel::Linear, &xs, &ys, &FitOptions::default()).unwrap();
        assert!(close(out.params[0], -0.1, 1e-10));
        assert!(close(out.params[1], 1.1, 1e-10));
        assert_eq!(out.evaluations, 1);
    }

    #[test]
    fn test_quadratic_exact() {
        // y = 0.02x^2 - 0.2x + 1
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys: Vec<f64> = xs.iter().map(|x| 0.02 * x * x - 0.2 * x + 1.0).collect();
        let out = fit(ZneModel::Quadratic, &xs, &ys, &FitOptions::default()).unwrap();
        assert!(close(out.params[0], 0.02, 1e-9));
        assert!(close(out.params[1], -0.2, 1e-9));
        assert!(close(out.params[2], 1.0, 1e-9));
    }

    #[test]
    fn test_exponential_recovers_parameters() {
        let xs: [f64; 5] = [1.0, 1.5, 2.0, 2.5, 3.0];
        let ys: Vec<f64> = xs.iter().map(|x| 0.8 * (-0.5 * x).exp() + 0.1).collect();
        let out = fit(ZneModel::Exponential, &xs, &ys, &FitOptions::default()).unwrap();
        assert!(close(out.params[0], 0.8, 1e-4), "a = {}", out.params[0]);
        assert!(close(out.params[1], 0.5, 1e-4), "b = {}", out.params[1]);
        assert!(close(out.params[2], 0.1, 1e-4), "c = {}", out.params[2]);
        assert!(out.evaluations > 1);
    }

    #[test]
    fn test_exponential_budget_exhausted() {
        let xs: [f64; 5] = [1.0, 1.5, 2.0, 2.5, 3.0];
        let ys: Vec<f64> = xs.iter().map(|x| 0.8 * (-0.5 * x).exp() + 0.1).collect();
        let opts = FitOptions::default().with_max_evaluations(2);
        let err = fit(ZneModel::Exponential, &xs, &ys, &opts).unwrap_err();
        assert!(matches!(err, ZneError::NotConverged { .. }));
    }

    #[test]
    fn test_exponential_negative_values() {
        // -0.8, -0.6, -0.45 is exactly a*r^x with r = 3/4, so y(0) = -0.8 / r.
        let xs = [1.0, 2.0, 3.0];
        let ys = [-0.8, -0.6, -0.45];
        let out = fit(ZneModel::Exponential, &xs, &ys, &FitOptions::default()).unwrap();
        let zero = out.params[0] + out.params[2];
        assert!(close(zero, -16.0 / 15.0, 1e-6), "zero = {zero}");
        assert!(r_squared(ZneModel::Exponential, &out.params, &xs, &ys) > 0.9999);
    }

    #[test]
    fn test_exponential_sign_symmetric() {
        let xs = [1.0, 2.0, 3.0];
        let opts = FitOptions::default();
        let pos = fit(ZneModel::Exponential, &xs, &[0.8, 0.6, 0.45], &opts).unwrap();
        let neg = fit(ZneModel::Exponential, &xs, &[-0.8, -0.6, -0.45], &opts).unwrap();
        assert!(close(pos.params[0], -neg.params[0], 1e-6));
        assert!(close(pos.params[1], neg.params[1], 1e-6));
        assert!(close(pos.params[2], -neg.params[2], 1e-6));
    }

    #[test]
    fn test_exponential_noisy_negative_values() {
        // Not exactly exponential; the least-squares optimum has cost ~9.1e-5
        // and y(0) ~ -0.72.
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [-0.5, -0.35, -0.27, -0.2];
        let out = fit(ZneModel::Exponential, &xs, &ys, &FitOptions::default()).unwrap();
        assert!(out.params.iter().all(|p| p.is_finite()));
        assert!(out.params[0].abs() < 10.0, "a = {}", out.params[0]);
        let p = Vector3::new(out.params[0], out.params[1], out.params[2]);
        let cost = exp_cost(&xs, &ys, &p);
        assert!(cost <= 1e-4, "cost = {cost}");
        let zero = out.params[0] + out.params[2];
        assert!(zero > -1.0 && zero < -0.5, "zero = {zero}");
    }

    #[test]
    fn test_exponential_noisy_decay() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [0.71, 0.52, 0.40, 0.29, 0.23];
        let out = fit(ZneModel::Exponential, &xs, &ys, &FitOptions::default()).unwrap();
        assert!(r_squared(ZneModel::Exponential, &out.params, &xs, &ys) > 0.99);
        assert!(close(out.params[0] + out.params[2], 0.966, 0.01));
        assert!(out.evaluations <= FitOptions::default().max_evaluations);
    }

    #[test]
    fn test_exponential_constant_values() {
        let xs = [1.0, 2.0, 3.0];
        let ys = [0.5, 0.5, 0.5];
        let out = fit(ZneModel::Exponential, &xs, &ys, &FitOptions::default()).unwrap();
        assert!(close(ZneModel::Exponential.evaluate(0.0, &out.params), 0.5, 1e-9));
    }

    #[test]
    fn test_exponential_identical_scales_singular() {
        let err = fit(
            ZneModel::Exponential,
            &[2.0, 2.0, 2.0],
            &[0.9, 0.8, 0.85],
            &FitOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ZneError::Singular(_)));
    }

    #[test]
    fn test_exponential_damping_saturation_is_not_convergence() {
        // From this start the damping blows up within a dozen evaluations.
        // The budget is too small for the grid seed, so nothing else can win.
        let xs = [1.0, 2.0, 3.0];
        let ys = [-0.8, -0.6, -0.45];
        let opts = FitOptions::default()
            .with_max_evaluations(150)
            .with_exponential_guess([-1.0, 100.0, 0.0]);
        let err = fit(ZneModel::Exponential, &xs, &ys, &opts).unwrap_err();
        assert!(matches!(err, ZneError::NotConverged { .. }));
    }

    #[test]
    fn test_length_mismatch() {
        let err = fit(ZneModel::Linear, &[1.0, 2.0], &[1.0], &FitOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ZneError::LengthMismatch {
                scales: 2,
                values: 1
            }
        ));
    }

    #[test]
    fn test_insufficient_data() {
        let err = fit(ZneModel::Quadratic, &[1.0, 2.0], &[1.0, 0.9], &FitOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ZneError::InsufficientData {
                required: 3,
                got: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = fit(
            ZneModel::Linear,
            &[1.0, 2.0, 3.0],
            &[1.0, f64::NAN, 0.8],
            &FitOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ZneError::NonFinite { index: 1, .. }));
    }

    #[test]
    fn test_identical_scales_singular() {
        let err = fit(
            ZneModel::Linear,
            &[2.0, 2.0, 2.0],
            &[0.9, 0.8, 0.85],
            &FitOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ZneError::Singular(_)));
    }

    #[test]
    fn test_r_squared_flat_values() {
        let r2 = r_squared(ZneModel::Linear, &[0.0, 0.5], &[1.0, 2.0], &[0.5, 0.5]);
        assert!(close(r2, 1.0, 1e-12));
    }

    proptest! {
        #[test]
        fn prop_linear_recovers_line(
            slope in -1.0f64..1.0,
            intercept in -1.0f64..1.0,
        ) {
            let xs = [1.0, 1.5, 2.0, 3.0];
            let ys: Vec<f64> = xs.iter().map(|x| slope * x + intercept).collect();
            let out = fit(ZneModel::Linear, &xs, &ys, &FitOptions::default()).unwrap();
            prop_assert!((out.params[0] - slope).abs() < 1e-9);
            prop_assert!((out.params[1] - intercept).abs() < 1e-9);
        }

        #[test]
        fn prop_exponential_recovers_zero_noise_value(
            a in prop_oneof![-1.0f64..-0.2, 0.2f64..1.0],
            b in 0.1f64..1.0,
            c in -0.2f64..0.2,
        ) {
            let xs: [f64; 5] = [1.0, 1.5, 2.0, 2.5, 3.0];
            let ys: Vec<f64> = xs.iter().map(|x| a * (-b * x).exp() + c).collect();
            let out = fit(ZneModel::Exponential, &xs, &ys, &FitOptions::default()).unwrap();
            prop_assert!((out.params[0] + out.params[2] - (a + c)).abs() < 1e-4);
        }

        #[test]
        fn prop_quadratic_never_worse_than_linear(
            ys in proptest::collection::vec(-1.0f64..1.0, 5),
        ) {
            let xs = [1.0, 1.5, 2.0, 2.5, 3.0];
            let opts = FitOptions::default();
            let lin = fit(ZneModel::Linear, &xs, &ys, &opts).unwrap();
            let quad = fit(ZneModel::Quadratic, &xs, &ys, &opts).unwrap();
            let r_lin = r_squared(ZneModel::Linear, &lin.params, &xs, &ys);
            let r_quad = r_squared(ZneModel::Quadratic, &quad.params, &xs, &ys);
            prop_assert!(r_quad >= r_lin - 1e-9);
        }
    }
}
