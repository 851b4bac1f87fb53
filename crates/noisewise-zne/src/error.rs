//! Error types for the extrapolation crate.

use thiserror::Error;

/// Errors that can occur while fitting or extrapolating.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ZneError {
    /// Method name is not one of the supported models.
    #[error("Unknown method '{0}'. Use 'linear', 'quadratic', or 'exponential'.")]
    UnknownMethod(String),

    /// Scales and values differ in length.
    #[error("Got {scales} noise scales but {values} measured values")]
    LengthMismatch { scales: usize, values: usize },

    /// Not enough data points for the number of fit parameters.
    #[error("{model} fit needs at least {required} points, got {got}")]
    InsufficientData {
        model: &'static str,
        required: usize,
        got: usize,
    },

    /// An input value is NaN or infinite.
    #[error("Non-finite {what} at index {index}")]
    NonFinite { what: &'static str, index: usize },

    /// The least-squares system has no stable solution.
    #[error("{0} fit is singular for the given noise scales")]
    Singular(&'static str),

    /// The iterative fit ran out of evaluations.
    #[error("{model} fit did not converge within {evaluations} evaluations")]
    NotConverged {
        model: &'static str,
        evaluations: usize,
    },
}

/// Result type for extrapolation operations.
pub type ZneResult<T> = Result<T, ZneError>;
