//! Zero-Noise Extrapolation (ZNE)
//!
//! ZNE runs a circuit at several artificially amplified noise levels and
//! extrapolates the measured expectation values back to the zero-noise limit
//! by fitting a noise-response model.
//!
//! # Models
//!
//! | Method | Form | Solver |
//! |--------|------|--------|
//! | `linear` | `a*x + b` | SVD least squares |
//! | `quadratic` | `a*x^2 + b*x + c` | SVD least squares |
//! | `exponential` | `a*exp(-b*x) + c` | Levenberg-Marquardt from `(1, 0.1, 0)` |
//!
//! # Example
//!
//! ```rust
//! use noisewise_zne::{extrapolate, DEFAULT_CURVE_SAMPLES};
//!
//! let scales = [1.0, 2.0, 3.0];
//! let values = [0.82, 0.67, 0.55];
//!
//! let result = extrapolate("quadratic", &scales, &values).unwrap();
//! println!("zero-noise estimate: {:.4}", result.zero_noise_value);
//!
//! // Points for plotting the fitted curve on [0, 3].
//! let curve = result.curve(DEFAULT_CURVE_SAMPLES);
//! assert_eq!(curve.len(), DEFAULT_CURVE_SAMPLES);
//! ```

pub mod error;
pub mod extrapolate;
pub mod fit;
pub mod model;

pub use error::{ZneError, ZneResult};
pub use extrapolate::{
    DEFAULT_CURVE_SAMPLES, Extrapolation, extrapolate, extrapolate_all, extrapolate_with,
};
pub use fit::{FitOptions, FitOutcome, fit, r_squared};
pub use model::ZneModel;
