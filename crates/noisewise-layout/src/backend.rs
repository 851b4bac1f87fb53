//! Calibration data of a quantum backend.
//!
//! Backend properties are plain data: the qubit count, basis gates, the
//! (possibly directed) coupling list as reported by the device, per-gate
//! error rates, and per-qubit readout errors.
//!
//! ```json
//! {
//!   "name": "ibm_torino",
//!   "num_qubits": 133,
//!   "basis_gates": ["cz", "id", "rx", "rz", "sx", "x"],
//!   "coupling_map": [[0, 1], [1, 0], [1, 2]],
//!   "gate_errors": [{"gate": "cz", "qubits": [0, 1], "error": 0.0031}],
//!   "readout_errors": [0.012, 0.02, 0.015]
//! }
//! ```

use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coupling::CouplingMap;
use crate::error::{LayoutError, LayoutResult};

/// Two-qubit gate names recognized for error lookup, in preference order.
pub const TWO_QUBIT_GATES: [&str; 3] = ["cx", "ecr", "cz"];

/// Error rate of one gate on specific qubits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateError {
    /// Gate name (e.g. "cz").
    pub gate: String,
    /// Physical qubits the gate acts on, in order.
    pub qubits: Vec<u32>,
    /// Error probability.
    pub error: f64,
}

/// Calibration snapshot of a backend.
///
/// Call [`validate`](Self::validate) after constructing by hand;
/// [`from_json_str`](Self::from_json_str) and [`load`](Self::load) do it
/// for you.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendProperties {
    /// Backend name.
    pub name: String,
    /// Number of physical qubits.
    pub num_qubits: u32,
    /// Native gate names.
    #[serde(default)]
    pub basis_gates: Vec<String>,
    /// Coupling list as reported; may be directed and contain both directions.
    #[serde(default)]
    pub coupling_map: Vec<[u32; 2]>,
    /// Gate error entries.
    #[serde(default)]
    pub gate_errors: Vec<GateError>,
    /// Readout error per qubit, indexed by qubit.
    #[serde(default)]
    pub readout_errors: Vec<f64>,
    /// (gate, qubits) -> error.
    #[serde(skip)]
    gate_index: FxHashMap<(String, Vec<u32>), f64>,
}

impl BackendProperties {
    /// Create properties with no calibration entries.
    pub fn new(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            basis_gates: vec![],
            coupling_map: vec![],
            gate_errors: vec![],
            readout_errors: vec![0.0; num_qubits as usize],
            gate_index: FxHashMap::default(),
        }
    }

    /// Set the basis gates.
    #[must_use]
    pub fn with_basis_gates(mut self, gates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.basis_gates = gates.into_iter().map(Into::into).collect();
        self
    }

    /// Set the coupling list.
    #[must_use]
    pub fn with_coupling(mut self, edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        self.coupling_map = edges.into_iter().map(|(a, b)| [a, b]).collect();
        self
    }

    /// Record a gate error.
    pub fn set_gate_error(&mut self, gate: impl Into<String>, qubits: &[u32], error: f64) {
        let gate = gate.into();
        self.gate_index.insert((gate.clone(), qubits.to_vec()), error);
        if let Some(entry) = self
            .gate_errors
            .iter_mut()
            .find(|e| e.gate == gate && e.qubits == qubits)
        {
            entry.error = error;
        } else {
            self.gate_errors.push(GateError {
                gate,
                qubits: qubits.to_vec(),
                error,
            });
        }
    }

    /// Record a readout error, growing the table if needed.
    pub fn set_readout_error(&mut self, qubit: u32, error: f64) {
        let idx = qubit as usize;
        if self.readout_errors.len() <= idx {
            self.readout_errors.resize(idx + 1, 0.0);
        }
        self.readout_errors[idx] = error;
    }

    /// Parse and validate properties from JSON.
    pub fn from_json_str(json: &str) -> LayoutResult<Self> {
        let mut props: Self = serde_json::from_str(json)?;
        props.validate()?;
        Ok(props)
    }

    /// Load and validate properties from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> LayoutResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| LayoutError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let props = Self::from_json_str(&source)?;
        debug!(
            backend = %props.name,
            qubits = props.num_qubits,
            couplings = props.coupling_map.len(),
            "loaded backend properties"
        );
        Ok(props)
    }

    /// Check internal consistency and rebuild the gate lookup.
    pub fn validate(&mut self) -> LayoutResult<()> {
        let n = self.num_qubits;
        let invalid = |reason: String| LayoutError::InvalidBackend {
            backend: self.name.clone(),
            reason,
        };

        if let Some([a, b]) = self.coupling_map.iter().find(|[a, b]| *a >= n || *b >= n) {
            return Err(invalid(format!(
                "coupling ({a}, {b}) references a qubit outside 0..{n}"
            )));
        }
        if self.readout_errors.len() != n as usize {
            return Err(invalid(format!(
                "expected {n} readout errors, got {}",
                self.readout_errors.len()
            )));
        }
        if let Some(q) = self
            .readout_errors
            .iter()
            .position(|e| !e.is_finite() || *e < 0.0)
        {
            return Err(invalid(format!("readout error of qubit {q} is not a rate")));
        }
        for entry in &self.gate_errors {
            if entry.qubits.iter().any(|&q| q >= n) {
                return Err(invalid(format!(
                    "gate '{}' on {:?} references a qubit outside 0..{n}",
                    entry.gate, entry.qubits
                )));
            }
            if !entry.error.is_finite() || entry.error < 0.0 {
                return Err(invalid(format!(
                    "error of gate '{}' on {:?} is not a rate",
                    entry.gate, entry.qubits
                )));
            }
        }

        self.rebuild_caches();
        Ok(())
    }

    /// Rebuild the gate lookup from `gate_errors`.
    pub fn rebuild_caches(&mut self) {
        self.gate_index = self
            .gate_errors
            .iter()
            .map(|e| ((e.gate.clone(), e.qubits.clone()), e.error))
            .collect();
    }

    /// Error rate of `gate` on exactly `qubits` (order matters).
    pub fn gate_error(&self, gate: &str, qubits: &[u32]) -> Option<f64> {
        // Lookup is empty when deserialized without `validate`.
        if self.gate_index.is_empty() {
            return self
                .gate_errors
                .iter()
                .find(|e| e.gate == gate && e.qubits == qubits)
                .map(|e| e.error);
        }
        self.gate_index
            .get(&(gate.to_string(), qubits.to_vec()))
            .copied()
    }

    /// Readout error of a qubit.
    pub fn readout_error(&self, qubit: u32) -> Option<f64> {
        self.readout_errors.get(qubit as usize).copied()
    }

    /// Undirected, de-duplicated coupling map: each connected pair appears
    /// once regardless of how many directions the device reports.
    pub fn coupling(&self) -> CouplingMap {
        CouplingMap::from_edges(self.num_qubits, self.coupling_map.iter().map(|&[a, b]| (a, b)))
    }

    /// The backend's two-qubit gate, if its basis has one of
    /// [`TWO_QUBIT_GATES`].
    pub fn two_qubit_gate(&self) -> LayoutResult<&'static str> {
        TWO_QUBIT_GATES
            .into_iter()
            .find(|g| self.basis_gates.iter().any(|b| b == g))
            .ok_or_else(|| LayoutError::NoTwoQubitGate {
                backend: self.name.clone(),
                basis: self.basis_gates.clone(),
            })
    }
}
