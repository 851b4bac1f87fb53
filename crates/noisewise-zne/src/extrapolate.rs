//! Zero-noise extrapolation on top of the model fits.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ZneResult;
use crate::fit::{FitOptions, fit, r_squared};
use crate::model::ZneModel;

/// Default number of points in a sampled fit curve.
pub const DEFAULT_CURVE_SAMPLES: usize = 200;

/// Result of fitting one model and evaluating it at zero noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extrapolation {
    /// Model that was fit.
    pub model: ZneModel,
    /// Noise scale factors.
    pub scales: Vec<f64>,
    /// Expectation values measured at each scale.
    pub values: Vec<f64>,
    /// Fitted parameters, in the order of [`ZneModel::evaluate`].
    pub params: Vec<f64>,
    /// Model value at zero noise.
    pub zero_noise_value: f64,
    /// Fit quality (R²).
    pub r_squared: f64,
    /// Cost evaluations spent on the fit.
    pub evaluations: usize,
}

impl Extrapolation {
    /// Evaluate the fitted model at noise scale `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.model.evaluate(x, &self.params)
    }

    /// Residuals `value - fit` at each measured scale.
    pub fn residuals(&self) -> Vec<f64> {
        self.scales
            .iter()
            .zip(&self.values)
            .map(|(&x, &y)| y - self.evaluate(x))
            .collect()
    }

    /// Sample the fitted curve at `samples` evenly spaced points on
    /// `[0, max(scales)]`.
    #[allow(clippy::cast_precision_loss)]
    pub fn curve(&self, samples: usize) -> Vec<(f64, f64)> {
        let x_max = self.scales.iter().copied().fold(0.0_f64, f64::max);
        match samples {
            0 => vec![],
            1 => vec![(0.0, self.zero_noise_value)],
            _ => {
                let step = x_max / (samples - 1) as f64;
                (0..samples)
                    .map(|i| {
                        let x = step * i as f64;
                        (x, self.evaluate(x))
                    })
                    .collect()
            }
        }
    }
}

/// Extrapolate to zero noise using a method name.
///
/// `method` is one of `"linear"`, `"quadratic"`, or `"exponential"`.
///
/// # Example
///
/// ```
/// use noisewise_zne::extrapolate;
///
/// let result = extrapolate("linear", &[1.0, 2.0, 3.0], &[1.0, 0.9, 0.8]).unwrap();
/// assert!((result.zero_noise_value - 1.1).abs() < 1e-9);
/// ```
pub fn extrapolate(method: &str, scales: &[f64], values: &[f64]) -> ZneResult<Extrapolation> {
    let model = method.parse::<ZneModel>()?;
    extrapolate_with(model, scales, values, &FitOptions::default())
}

/// Extrapolate to zero noise with an explicit model and fit options.
pub fn extrapolate_with(
    model: ZneModel,
    scales: &[f64],
    values: &[f64],
    options: &FitOptions,
) -> ZneResult<Extrapolation> {
    let outcome = fit(model, scales, values, options)?;
    let zero_noise_value = model.evaluate(0.0, &outcome.params);
    let r_squared = r_squared(model, &outcome.params, scales, values);

    info!(
        model = %model,
        zero_noise_value,
        r_squared,
        "zero-noise extrapolation"
    );

    Ok(Extrapolation {
        model,
        scales: scales.to_vec(),
        values: values.to_vec(),
        params: outcome.params,
        zero_noise_value,
        r_squared,
        evaluations: outcome.evaluations,
    })
}

/// Fit every model to the same data, best R² first.
///
/// Models that fail to fit (too few points, no convergence) are skipped.
pub fn extrapolate_all(scales: &[f64], values: &[f64], options: &FitOptions) -> Vec<Extrapolation> {
    let mut results: Vec<Extrapolation> = ZneModel::ALL
        .iter()
        .filter_map(|&model| match extrapolate_with(model, scales, values, options) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!(model = %model, error = %e, "skipping model");
                None
            }
        })
        .collect();

    results.sort_by(|a, b| b.r_squared.total_cmp(&a.r_squared));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZneError;

    #[test]
    fn test_linear_extrapolation() {
        let result = extrapolate("linear", &[1.0, 2.0, 3.0], &[1.0, 0.9, 0.8]).unwrap();
        assert!((result.zero_noise_value - 1.1).abs() < 1e-9);
        assert!(result.r_squared > 0.999);
        assert_eq!(result.values, vec![1.0, 0.9, 0.8]);
    }

    #[test]
    fn test_exponential_extrapolation() {
        let scales: [f64; 5] = [1.0, 1.5, 2.0, 2.5, 3.0];
        let values: Vec<f64> = scales.iter().map(|x| 0.8 * (-0.5 * x).exp() + 0.1).collect();
        let result = extrapolate("exponential", &scales, &values).unwrap();
        assert!((result.zero_noise_value - 0.9).abs() < 1e-3);
    }

    #[test]
    fn test_exponential_extrapolation_negative_values() {
        let result = extrapolate("exponential", &[1.0, 2.0, 3.0, 4.0], &[-0.5, -0.35, -0.27, -0.2])
            .unwrap();
        assert!(result.params.iter().all(|p| p.is_finite()));
        assert!(result.r_squared > 0.99, "r2 = {}", result.r_squared);
        assert!(result.zero_noise_value > -1.0 && result.zero_noise_value < -0.5);
        assert!(result.residuals().iter().all(|r| r.abs() < 0.02));
    }

    #[test]
    fn test_unknown_method() {
        let err = extrapolate("cubic", &[1.0, 2.0], &[1.0, 0.5]).unwrap_err();
        assert!(matches!(err, ZneError::UnknownMethod(ref m) if m == "cubic"));
    }

    #[test]
    fn test_curve_spans_zero_to_max_scale() {
        let result = extrapolate("linear", &[1.0, 3.0, 2.0], &[0.9, 0.7, 0.8]).unwrap();
        let curve = result.curve(DEFAULT_CURVE_SAMPLES);
        assert_eq!(curve.len(), 200);
        assert_eq!(curve[0].0, 0.0);
        assert!((curve[0].1 - result.zero_noise_value).abs() < 1e-12);
        assert!((curve[199].0 - 3.0).abs() < 1e-12);
        assert!(result.curve(0).is_empty());
    }

    #[test]
    fn test_residuals_zero_on_exact_fit() {
        let result = extrapolate("quadratic", &[1.0, 2.0, 3.0], &[0.9, 0.7, 0.4]).unwrap();
        assert!(result.residuals().iter().all(|r| r.abs() < 1e-9));
    }

    #[test]
    fn test_extrapolate_all_orders_by_fit_quality() {
        let scales = [1.0, 2.0, 3.0, 4.0];
        let values = [0.9, 0.75, 0.65, 0.6];
        let results = extrapolate_all(&scales, &values, &FitOptions::default());
        assert!(!results.is_empty());
        for pair in results.windows(2) {
            assert!(pair[0].r_squared >= pair[1].r_squared);
        }
    }

    #[test]
    fn test_extrapolate_all_skips_underdetermined() {
        let results = extrapolate_all(&[1.0, 2.0], &[0.9, 0.8], &FitOptions::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].model, ZneModel::Linear);
    }
}
