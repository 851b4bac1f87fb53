//! Zigzag interaction pattern and its embeddings in a coupling graph.
//!
//! The pattern has two linear chains of `n` nodes (`0..n` and `n..2n`) and
//! bridge nodes numbered from `2n`. Bridge `k` connects chain node `i` to
//! chain node `i + n`, for every `i < span` with `i % 4 == 0`:
//!
//! ```text
//!  0 ── 1 ── 2 ── 3 ── 4 ── 5 ── 6
//!  │                   │
//! 14                  15
//!  │                   │
//!  7 ── 8 ── 9 ──10 ──11 ──12 ──13
//! ```
//!
//! This spacing matches the bridge qubits of heavy-hex lattices, so the
//! widest pattern embeds where two device rows run side by side.

use petgraph::algo::{is_isomorphic_subgraph, subgraph_isomorphisms_iter};
use petgraph::graph::{NodeIndex, UnGraph};
use tracing::debug;

use crate::coupling::CouplingMap;
use crate::error::{LayoutError, LayoutResult};

/// Spacing between bridge nodes along a chain.
pub const BRIDGE_SPACING: u32 = 4;

/// Two disconnected linear chains of `n` nodes each.
pub fn linear_chains(n: u32) -> UnGraph<u32, ()> {
    let mut graph = UnGraph::with_capacity(2 * n as usize, 2 * n.saturating_sub(1) as usize);
    for v in 0..2 * n {
        graph.add_node(v);
    }
    for start in [0, n] {
        for v in start..(start + n).saturating_sub(1) {
            graph.add_edge(node(v), node(v + 1), ());
        }
    }
    graph
}

#[inline]
fn node(v: u32) -> NodeIndex {
    NodeIndex::new(v as usize)
}

/// A zigzag pattern: two chains plus bridge nodes.
#[derive(Debug, Clone)]
pub struct ZigzagPattern {
    graph: UnGraph<u32, ()>,
    chain_length: u32,
    num_bridges: u32,
}

impl ZigzagPattern {
    /// Build the pattern with bridges on chain positions `i < span`,
    /// `i % 4 == 0`.
    pub fn new(chain_length: u32, span: u32) -> Self {
        let mut graph = linear_chains(chain_length);
        let mut num_bridges = 0;
        for i in (0..span.min(chain_length)).step_by(BRIDGE_SPACING as usize) {
            let bridge = 2 * chain_length + num_bridges;
            let b = graph.add_node(bridge);
            graph.add_edge(node(i), b, ());
            graph.add_edge(b, node(i + chain_length), ());
            num_bridges += 1;
        }
        Self {
            graph,
            chain_length,
            num_bridges,
        }
    }

    /// Number of bridge nodes `span` would produce.
    pub fn bridges_for_span(chain_length: u32, span: u32) -> u32 {
        span.min(chain_length).div_ceil(BRIDGE_SPACING)
    }

    /// Nodes per chain.
    pub fn chain_length(&self) -> u32 {
        self.chain_length
    }

    /// Number of bridge nodes.
    pub fn num_bridge_qubits(&self) -> u32 {
        self.num_bridges
    }

    /// Total number of virtual qubits.
    pub fn num_qubits(&self) -> u32 {
        2 * self.chain_length + self.num_bridges
    }

    /// Virtual edges: first chain, second chain, then bridge pairs.
    #[allow(clippy::cast_possible_truncation)]
    pub fn edges(&self) -> Vec<(u32, u32)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (a.index() as u32, b.index() as u32))
            .collect()
    }

    /// The underlying graph; node index `i` is virtual qubit `i`.
    pub fn graph(&self) -> &UnGraph<u32, ()> {
        &self.graph
    }

    /// Whether the pattern is isomorphic to a subgraph of `target`.
    pub fn embeds_in(&self, target: &UnGraph<u32, ()>) -> bool {
        if self.graph.node_count() > target.node_count()
            || self.graph.edge_count() > target.edge_count()
        {
            return false;
        }
        is_isomorphic_subgraph(&self.graph, target)
    }
}

/// Find the widest zigzag pattern that fits on `coupling`.
///
/// Starts with bridges along the whole chain and narrows the bridged span one
/// position at a time. Spans that give the same bridge count produce the same
/// pattern and are only checked once. Fails when not even the two bare chains
/// embed.
pub fn build_zigzag_pattern(chain_length: u32, coupling: &CouplingMap) -> LayoutResult<ZigzagPattern> {
    let no_embedding = || LayoutError::NoEmbedding {
        num_orbitals: chain_length,
        num_qubits: coupling.num_qubits(),
    };
    // The bare chains alone need 2n qubits.
    if 2 * u64::from(chain_length) > u64::from(coupling.num_qubits()) {
        debug!(chain_length, num_qubits = coupling.num_qubits(), "chains exceed device size");
        return Err(no_embedding());
    }

    let target = coupling.to_graph();
    let mut rejected: Option<u32> = None;

    for span in (0..=chain_length).rev() {
        let bridges = ZigzagPattern::bridges_for_span(chain_length, span);
        if rejected == Some(bridges) {
            continue;
        }

        let pattern = ZigzagPattern::new(chain_length, span);
        if pattern.embeds_in(&target) {
            debug!(
                chain_length,
                bridges = pattern.num_bridge_qubits(),
                "zigzag pattern embeds"
            );
            return Ok(pattern);
        }
        debug!(chain_length, bridges, "zigzag pattern does not embed");
        rejected = Some(bridges);
    }

    Err(no_embedding())
}

/// Enumerate embeddings of `pattern` in `coupling`.
///
/// Each layout is indexed by virtual qubit: `layout[v]` is the physical qubit
/// hosting virtual qubit `v`. Enumeration stops after `max_mappings` layouts
/// when given.
#[allow(clippy::cast_possible_truncation)]
pub fn find_layouts(
    pattern: &ZigzagPattern,
    coupling: &CouplingMap,
    max_mappings: Option<usize>,
) -> Vec<Vec<u32>> {
    let target = coupling.to_graph();
    let g0 = pattern.graph();
    let g1 = &target;
    let mut node_match = |_: &u32, _: &u32| true;
    let mut edge_match = |_: &(), _: &()| true;

    let Some(mappings) = subgraph_isomorphisms_iter(&g0, &g1, &mut node_match, &mut edge_match)
    else {
        return vec![];
    };

    let layouts: Vec<Vec<u32>> = mappings
        .take(max_mappings.unwrap_or(usize::MAX))
        .map(|m| m.into_iter().map(|p| p as u32).collect())
        .collect();

    debug!(
        layouts = layouts.len(),
        pattern_qubits = pattern.num_qubits(),
        "enumerated zigzag embeddings"
    );
    layouts
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_linear_chains() {
        let g = linear_chains(4);
        assert_eq!(g.node_count(), 8);
        assert_eq!(g.edge_count(), 6);
        assert!(g.contains_edge(node(0), node(1)));
        assert!(g.contains_edge(node(6), node(7)));
        assert!(!g.contains_edge(node(3), node(4)));
    }

    #[test]
    fn test_pattern_bridges() {
        let p = ZigzagPattern::new(7, 7);
        // Bridges at chain positions 0 and 4.
        assert_eq!(p.num_bridge_qubits(), 2);
        assert_eq!(p.num_qubits(), 16);
        let edges = p.edges();
        assert!(edges.contains(&(0, 14)));
        assert!(edges.contains(&(14, 7)));
        assert!(edges.contains(&(4, 15)));
        assert!(edges.contains(&(15, 11)));
        assert_eq!(edges.len(), 6 + 6 + 4);
    }

    #[test]
    fn test_pattern_edge_order() {
        let edges = ZigzagPattern::new(2, 2).edges();
        assert_eq!(edges, vec![(0, 1), (2, 3), (0, 4), (4, 2)]);
    }

    #[test]
    fn test_full_pattern_embeds_on_heavy_hex() {
        let cmap = CouplingMap::heavy_hex(2, 9);
        let pattern = build_zigzag_pattern(5, &cmap).unwrap();
        assert_eq!(pattern.num_bridge_qubits(), 2);
    }

    #[test]
    fn test_pattern_narrows_to_fit() {
        // Two rows of 5 joined by a single bridge at column 0.
        let mut cmap = CouplingMap::new(11);
        for base in [0, 5] {
            for c in 0..4 {
                cmap.add_edge(base + c, base + c + 1);
            }
        }
        cmap.add_edge(0, 10);
        cmap.add_edge(10, 5);

        let pattern = build_zigzag_pattern(5, &cmap).unwrap();
        assert_eq!(pattern.num_bridge_qubits(), 1);
    }

    #[test]
    fn test_bare_chains_when_no_bridge_fits() {
        // Two separate 3-qubit lines: room for the chains, none for a bridge.
        let cmap = CouplingMap::from_edges(6, [(0, 1), (1, 2), (3, 4), (4, 5)]);
        let pattern = build_zigzag_pattern(3, &cmap).unwrap();
        assert_eq!(pattern.num_bridge_qubits(), 0);
        assert_eq!(pattern.num_qubits(), 6);
    }

    #[test]
    fn test_no_embedding() {
        let cmap = CouplingMap::linear(4);
        let err = build_zigzag_pattern(3, &cmap).unwrap_err();
        assert!(matches!(err, LayoutError::NoEmbedding { num_orbitals: 3, .. }));
    }

    #[test]
    fn test_oversized_chain_fails_fast() {
        let cmap = CouplingMap::heavy_hex(2, 9);
        let start = std::time::Instant::now();
        let err = build_zigzag_pattern(20_000, &cmap).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::NoEmbedding {
                num_orbitals: 20_000,
                num_qubits: 21
            }
        ));
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
        assert!(build_zigzag_pattern(u32::MAX, &cmap).is_err());
    }

    #[test]
    fn test_layouts_respect_edges() {
        let cmap = CouplingMap::heavy_hex(2, 9);
        let pattern = build_zigzag_pattern(5, &cmap).unwrap();
        let layouts = find_layouts(&pattern, &cmap, None);
        assert!(!layouts.is_empty());
        for layout in &layouts {
            assert_eq!(layout.len(), pattern.num_qubits() as usize);
            for (a, b) in pattern.edges() {
                assert!(cmap.is_connected(layout[a as usize], layout[b as usize]));
            }
            let mut seen = layout.clone();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), layout.len());
        }
    }

    #[test]
    fn test_layout_cap() {
        let cmap = CouplingMap::heavy_hex(2, 9);
        let pattern = build_zigzag_pattern(5, &cmap).unwrap();
        assert_eq!(find_layouts(&pattern, &cmap, Some(3)).len(), 3);
    }

    #[test]
    fn test_oversized_pattern_has_no_layouts() {
        let pattern = ZigzagPattern::new(10, 10);
        assert!(find_layouts(&pattern, &CouplingMap::linear(5), None).is_empty());
    }

    proptest! {
        #[test]
        fn prop_bridge_count_matches_span(n in 1u32..40, span in 0u32..40) {
            let p = ZigzagPattern::new(n, span);
            prop_assert_eq!(p.num_bridge_qubits(), ZigzagPattern::bridges_for_span(n, span));
            prop_assert_eq!(
                p.edges().len() as u32,
                2 * (n - 1) + 2 * p.num_bridge_qubits()
            );
        }
    }
}
