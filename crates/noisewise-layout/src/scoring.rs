//! Lightweight error scoring of candidate layouts.
//!
//! A layout's score is the sum of the two-qubit gate errors on every coupling
//! the pattern uses plus the readout errors of every qubit it occupies. Lower
//! is better. This ignores single-qubit gate errors and crosstalk; it is meant
//! to rank isomorphic candidates, not to predict fidelity.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::backend::BackendProperties;
use crate::error::{LayoutError, LayoutResult};

/// Qubits and couplings a layout must avoid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringFilter {
    /// Physical qubits with unacceptable measurement error.
    #[serde(default)]
    pub bad_readout_qubits: Vec<u32>,
    /// Physical couplings with unacceptable two-qubit gate error.
    /// Matched in either direction.
    #[serde(default)]
    pub bad_edges: Vec<(u32, u32)>,
}

impl ScoringFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude a qubit.
    #[must_use]
    pub fn with_bad_qubit(mut self, qubit: u32) -> Self {
        self.bad_readout_qubits.push(qubit);
        self
    }

    /// Exclude a coupling.
    #[must_use]
    pub fn with_bad_edge(mut self, q0: u32, q1: u32) -> Self {
        self.bad_edges.push((q0, q1));
        self
    }

    /// Whether the filter excludes nothing.
    pub fn is_empty(&self) -> bool {
        self.bad_readout_qubits.is_empty() && self.bad_edges.is_empty()
    }
}

/// Compiled form of a [`ScoringFilter`] for repeated checks.
struct FilterSet {
    qubits: FxHashSet<u32>,
    edges: FxHashSet<(u32, u32)>,
}

impl FilterSet {
    fn new(filter: &ScoringFilter) -> Self {
        Self {
            qubits: filter.bad_readout_qubits.iter().copied().collect(),
            edges: filter
                .bad_edges
                .iter()
                .map(|&(a, b)| (a.min(b), a.max(b)))
                .collect(),
        }
    }

    fn rejects(&self, layout: &[u32], virtual_edges: &[(u32, u32)]) -> LayoutResult<bool> {
        if layout.iter().any(|q| self.qubits.contains(q)) {
            return Ok(true);
        }
        for &(a, b) in virtual_edges {
            let (p, q) = (physical(layout, a)?, physical(layout, b)?);
            if self.edges.contains(&(p.min(q), p.max(q))) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Physical qubit hosting `virtual_qubit`.
fn physical(layout: &[u32], virtual_qubit: u32) -> LayoutResult<u32> {
    layout
        .get(virtual_qubit as usize)
        .copied()
        .ok_or(LayoutError::ShortLayout {
            virtual_qubit,
            len: layout.len(),
        })
}

/// A candidate layout and its error score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredLayout {
    /// Physical qubit per virtual qubit.
    pub layout: Vec<u32>,
    /// Summed two-qubit gate and readout error.
    pub score: f64,
}

/// Score one layout without filtering.
///
/// Gate errors are looked up on the mapped coupling as given, then reversed.
pub fn score_layout(
    props: &BackendProperties,
    virtual_edges: &[(u32, u32)],
    layout: &[u32],
    two_qubit_gate: &str,
) -> LayoutResult<f64> {
    let mut gate_total = 0.0;
    for &(a, b) in virtual_edges {
        let (p, q) = (physical(layout, a)?, physical(layout, b)?);
        let error = props
            .gate_error(two_qubit_gate, &[p, q])
            .or_else(|| props.gate_error(two_qubit_gate, &[q, p]))
            .ok_or_else(|| LayoutError::MissingGateError {
                gate: two_qubit_gate.to_string(),
                q0: p,
                q1: q,
            })?;
        gate_total += error;
    }

    let mut readout_total = 0.0;
    for &q in layout {
        readout_total += props
            .readout_error(q)
            .ok_or(LayoutError::MissingReadoutError(q))?;
    }

    Ok(gate_total + readout_total)
}

/// Score candidate layouts, dropping those the filter rejects.
///
/// The result is sorted by ascending score; ties keep the input order.
pub fn score_layouts(
    props: &BackendProperties,
    virtual_edges: &[(u32, u32)],
    layouts: &[Vec<u32>],
    two_qubit_gate: &str,
    filter: &ScoringFilter,
) -> LayoutResult<Vec<ScoredLayout>> {
    let filter_set = FilterSet::new(filter);
    let mut scores = Vec::with_capacity(layouts.len());

    for layout in layouts {
        if filter_set.rejects(layout, virtual_edges)? {
            trace!(?layout, "layout rejected by filter");
            continue;
        }
        let score = score_layout(props, virtual_edges, layout, two_qubit_gate)?;
        scores.push(ScoredLayout {
            layout: layout.clone(),
            score,
        });
    }

    scores.sort_by(|a, b| a.score.total_cmp(&b.score));
    debug!(
        candidates = layouts.len(),
        scored = scores.len(),
        best = ?scores.first().map(|s| s.score),
        "scored layouts"
    );
    Ok(scores)
}
