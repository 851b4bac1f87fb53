//! End-to-end zigzag layout selection for a backend.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::BackendProperties;
use crate::error::{LayoutError, LayoutResult};
use crate::scoring::{ScoringFilter, score_layouts};
use crate::zigzag::{build_zigzag_pattern, find_layouts};

/// Options for [`zigzag_layout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZigzagOptions {
    /// Orbitals per chain.
    pub num_orbitals: u32,
    /// Extra qubits appended to each chain.
    #[serde(default)]
    pub num_ancillas: u32,
    /// Rank embeddings by error score; otherwise take the first embedding.
    #[serde(default = "default_true")]
    pub score_layouts: bool,
    /// Qubits and couplings to avoid while scoring.
    #[serde(default, flatten)]
    pub filter: ScoringFilter,
    /// Stop enumerating embeddings after this many.
    #[serde(default)]
    pub max_mappings: Option<usize>,
}

fn default_true() -> bool {
    true
}

impl ZigzagOptions {
    /// Options for `num_orbitals` orbitals with scoring on and no filter.
    pub fn new(num_orbitals: u32) -> Self {
        Self {
            num_orbitals,
            num_ancillas: 0,
            score_layouts: true,
            filter: ScoringFilter::default(),
            max_mappings: None,
        }
    }

    /// Set the ancilla count.
    #[must_use]
    pub fn with_ancillas(mut self, num_ancillas: u32) -> Self {
        self.num_ancillas = num_ancillas;
        self
    }

    /// Enable or disable scoring.
    #[must_use]
    pub fn with_scoring(mut self, enabled: bool) -> Self {
        self.score_layouts = enabled;
        self
    }

    /// Set the scoring filter.
    #[must_use]
    pub fn with_filter(mut self, filter: ScoringFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Cap the number of enumerated embeddings.
    #[must_use]
    pub fn with_max_mappings(mut self, max: usize) -> Self {
        self.max_mappings = Some(max);
        self
    }

    /// Qubits per chain, or `None` if the sum overflows.
    pub fn chain_length(&self) -> Option<u32> {
        self.num_orbitals.checked_add(self.num_ancillas)
    }
}

/// Selected layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZigzagLayout {
    /// Physical qubits of both chains: the first chain, then the second.
    /// Suitable as an initial layout for a transpiler.
    pub initial_layout: Vec<u32>,
    /// Physical qubits hosting the bridge nodes.
    pub bridge_qubits: Vec<u32>,
    /// Number of bridge (alpha-beta) qubits in the pattern.
    pub num_bridge_qubits: u32,
    /// Error score, when scoring was enabled.
    pub score: Option<f64>,
    /// Number of embeddings considered.
    pub candidates: usize,
}

/// Select a zigzag layout on `props`' coupling graph.
///
/// # Example
///
/// ```
/// use noisewise_layout::{BackendProperties, CouplingMap, ZigzagOptions, zigzag_layout};
///
/// let cmap = CouplingMap::heavy_hex(2, 9);
/// let mut props = BackendProperties::new("demo", cmap.num_qubits())
///     .with_basis_gates(["cz", "rz", "sx"])
///     .with_coupling(cmap.edges().iter().copied());
/// for &(a, b) in cmap.edges() {
///     props.set_gate_error("cz", &[a, b], 0.01);
/// }
///
/// let layout = zigzag_layout(&props, &ZigzagOptions::new(5)).unwrap();
/// assert_eq!(layout.initial_layout.len(), 10);
/// assert_eq!(layout.num_bridge_qubits, 2);
/// ```
pub fn zigzag_layout(props: &BackendProperties, options: &ZigzagOptions) -> LayoutResult<ZigzagLayout> {
    let Some(chain_length) = options.chain_length() else {
        return Err(LayoutError::InvalidOptions(format!(
            "num_orbitals + num_ancillas overflows ({} + {})",
            options.num_orbitals, options.num_ancillas
        )));
    };
    if chain_length == 0 {
        return Err(LayoutError::InvalidOptions(
            "num_orbitals + num_ancillas must be at least 1".into(),
        ));
    }
    if options.max_mappings == Some(0) {
        return Err(LayoutError::InvalidOptions("max_mappings must be at least 1".into()));
    }

    let coupling = props.coupling();
    let pattern = build_zigzag_pattern(chain_length, &coupling)?;
    let layouts = find_layouts(&pattern, &coupling, options.max_mappings);
    if layouts.is_empty() {
        return Err(LayoutError::NoEmbedding {
            num_orbitals: chain_length,
            num_qubits: coupling.num_qubits(),
        });
    }

    let (mut full, score) = if options.score_layouts {
        let gate = props.two_qubit_gate()?;
        let scored = score_layouts(props, &pattern.edges(), &layouts, gate, &options.filter)?;
        let Some(best) = scored.into_iter().next() else {
            return Err(LayoutError::NoViableLayout {
                candidates: layouts.len(),
            });
        };
        (best.layout, Some(best.score))
    } else {
        if !options.filter.is_empty() {
            warn!("scoring disabled; bad qubit and coupling filters are ignored");
        }
        (layouts[0].clone(), None)
    };

    let bridge_qubits = full.split_off(2 * chain_length as usize);

    info!(
        backend = %props.name,
        chain_length,
        bridges = pattern.num_bridge_qubits(),
        candidates = layouts.len(),
        score = ?score,
        "selected zigzag layout"
    );

    Ok(ZigzagLayout {
        initial_layout: full,
        bridge_qubits,
        num_bridge_qubits: pattern.num_bridge_qubits(),
        score,
        candidates: layouts.len(),
    })
}
