//! Noise-response models used for extrapolation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ZneError;

/// A model of how an expectation value responds to scaled noise.
///
/// | Model | Form |
/// |-------|------|
/// | `Linear` | `a*x + b` |
/// | `Quadratic` | `a*x^2 + b*x + c` |
/// | `Exponential` | `a*exp(-b*x) + c` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZneModel {
    Linear,
    Quadratic,
    Exponential,
}

impl ZneModel {
    /// All supported models, in the order they are tried by
    /// [`extrapolate_all`](crate::extrapolate_all).
    pub const ALL: [ZneModel; 3] = [Self::Linear, Self::Quadratic, Self::Exponential];

    /// Lowercase method name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Quadratic => "quadratic",
            Self::Exponential => "exponential",
        }
    }

    /// Capitalized name, suitable for a legend entry.
    pub fn label(self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::Quadratic => "Quadratic",
            Self::Exponential => "Exponential",
        }
    }

    /// Number of free parameters.
    pub fn num_params(self) -> usize {
        match self {
            Self::Linear => 2,
            Self::Quadratic | Self::Exponential => 3,
        }
    }

    /// Evaluate the model at `x`.
    ///
    /// `params` must hold at least [`num_params`](Self::num_params) values.
    #[inline]
    pub fn evaluate(self, x: f64, params: &[f64]) -> f64 {
        match self {
            Self::Linear => params[0] * x + params[1],
            Self::Quadratic => params[0] * x * x + params[1] * x + params[2],
            Self::Exponential => params[0] * (-params[1] * x).exp() + params[2],
        }
    }
}

impl fmt::Display for ZneModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ZneModel {
    type Err = ZneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "quadratic" => Ok(Self::Quadratic),
            "exponential" => Ok(Self::Exponential),
            _ => Err(ZneError::UnknownMethod(s.to_string())),
        }
    }
}
