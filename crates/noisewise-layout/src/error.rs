//! Error types for the layout crate.

use thiserror::Error;

/// Errors that can occur during layout selection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LayoutError {
    /// Reading a properties file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Properties JSON is malformed.
    #[error("Invalid backend JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Properties are internally inconsistent.
    #[error("Invalid backend '{backend}': {reason}")]
    InvalidBackend { backend: String, reason: String },

    /// Basis has none of the known two-qubit gates.
    #[error("Backend '{backend}' has no two-qubit gate among cx, ecr, cz (basis: {basis:?})")]
    NoTwoQubitGate { backend: String, basis: Vec<String> },

    /// Options are unusable.
    #[error("Invalid layout options: {0}")]
    InvalidOptions(String),

    /// Even two bare chains do not fit on the device.
    #[error("No zigzag pattern with {num_orbitals} orbitals embeds in a {num_qubits}-qubit coupling graph")]
    NoEmbedding { num_orbitals: u32, num_qubits: u32 },

    /// Gate error missing in both directions.
    #[error("No '{gate}' error for coupling ({q0}, {q1}) in either direction")]
    MissingGateError { gate: String, q0: u32, q1: u32 },

    /// Readout error missing.
    #[error("No readout error for qubit {0}")]
    MissingReadoutError(u32),

    /// Layout is shorter than the pattern it is scored against.
    #[error("Layout has {len} qubits but the pattern uses virtual qubit {virtual_qubit}")]
    ShortLayout { virtual_qubit: u32, len: usize },

    /// Every candidate layout was filtered out.
    #[error("All {candidates} candidate layouts use a bad qubit or coupling")]
    NoViableLayout { candidates: usize },
}

/// Result type for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;
