//! Physical connectivity of a quantum processor.

use petgraph::graph::{NodeIndex, UnGraph};
use rustc_hash::FxHashMap;

/// Target device coupling map.
///
/// The coupling map defines which pairs of physical qubits can
/// interact with two-qubit gates. Edges are undirected: `(a, b)` and
/// `(b, a)` describe the same coupling and are stored once.
#[derive(Debug, Clone)]
pub struct CouplingMap {
    /// List of connected qubit pairs (bidirectional).
    edges: Vec<(u32, u32)>,
    /// Number of physical qubits.
    num_qubits: u32,
    /// Adjacency list for fast lookup.
    adjacency: FxHashMap<u32, Vec<u32>>,
}

impl CouplingMap {
    /// Create a new coupling map with the given number of qubits.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            edges: vec![],
            num_qubits,
            adjacency: FxHashMap::default(),
        }
    }

    /// Build a coupling map from a possibly directed, possibly duplicated
    /// edge list. Self-loops are dropped.
    pub fn from_edges(num_qubits: u32, edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut map = Self::new(num_qubits);
        for (a, b) in edges {
            if a != b {
                map.add_edge(a, b);
            }
        }
        map
    }

    /// Add an edge between two qubits (bidirectional).
    ///
    /// Duplicate edges (including reversed pairs) are silently ignored.
    pub fn add_edge(&mut self, q1: u32, q2: u32) {
        if self.is_connected(q1, q2) {
            return;
        }
        self.edges.push((q1, q2));
        self.adjacency.entry(q1).or_default().push(q2);
        self.adjacency.entry(q2).or_default().push(q1);
        self.num_qubits = self.num_qubits.max(q1.max(q2) + 1);
    }

    /// Check if two qubits are directly connected.
    #[inline]
    pub fn is_connected(&self, q1: u32, q2: u32) -> bool {
        self.adjacency
            .get(&q1)
            .is_some_and(|neighbors| neighbors.contains(&q2))
    }

    /// Get the number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the coupling edges.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Get the number of couplings.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Undirected graph whose node index `i` is physical qubit `i`.
    pub fn to_graph(&self) -> UnGraph<u32, ()> {
        let mut graph = UnGraph::with_capacity(self.num_qubits as usize, self.edges.len());
        for q in 0..self.num_qubits {
            graph.add_node(q);
        }
        for &(a, b) in &self.edges {
            graph.add_edge(NodeIndex::new(a as usize), NodeIndex::new(b as usize), ());
        }
        graph
    }

    /// Create a linear coupling map (0-1-2-3-...).
    pub fn linear(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 0..n.saturating_sub(1) {
            map.add_edge(i, i + 1);
        }
        map
    }

    /// Create a fully connected coupling map.
    pub fn full(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                map.add_edge(i, j);
            }
        }
        map
    }

    /// Create a star topology (center qubit connected to all others).
    pub fn star(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 1..n {
            map.add_edge(0, i);
        }
        map
    }

    /// Create a heavy-hex style lattice.
    ///
    /// `rows` linear chains of `width` qubits (row `r` holds qubits
    /// `r*width .. (r+1)*width`). Consecutive rows are joined through bridge
    /// qubits, numbered after all row qubits, on every fourth column. The
    /// first column offset alternates between 0 and 2 from one row gap to the
    /// next, as on IBM Falcon/Eagle/Heron devices.
    pub fn heavy_hex(rows: u32, width: u32) -> Self {
        let mut map = Self::new(rows * width);
        for r in 0..rows {
            let base = r * width;
            for c in 0..width.saturating_sub(1) {
                map.add_edge(base + c, base + c + 1);
            }
        }

        let mut next = rows * width;
        for r in 0..rows.saturating_sub(1) {
            let offset = if r % 2 == 0 { 0 } else { 2 };
            for c in (offset..width).step_by(4) {
                map.add_edge(r * width + c, next);
                map.add_edge(next, (r + 1) * width + c);
                next += 1;
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupling_map_linear() {
        let map = CouplingMap::linear(5);
        assert!(map.is_connected(0, 1));
        assert!(map.is_connected(1, 0));
        assert!(!map.is_connected(0, 2));
        assert_eq!(map.num_edges(), 4);
    }

    #[test]
    fn test_coupling_map_star() {
        let map = CouplingMap::star(5);
        assert!(map.is_connected(0, 4));
        assert!(!map.is_connected(1, 2));
        assert!((1..5).all(|q| map.is_connected(0, q)));
        assert_eq!(map.num_edges(), 4);
    }

    #[test]
    fn test_coupling_map_full() {
        let map = CouplingMap::full(4);
        assert_eq!(map.num_qubits(), 4);
        assert_eq!(map.num_edges(), 6);
        for a in 0..4 {
            for b in 0..4 {
                assert_eq!(map.is_connected(a, b), a != b, "({a}, {b})");
            }
        }
        assert_eq!(CouplingMap::full(1).num_edges(), 0);
    }

    #[test]
    fn test_duplicate_and_reversed_edges_collapse() {
        let map = CouplingMap::from_edges(3, [(0, 1), (1, 0), (1, 2), (2, 1), (1, 2), (2, 2)]);
        assert_eq!(map.num_edges(), 2);
        assert_eq!(map.num_qubits(), 3);
    }

    #[test]
    fn test_heavy_hex_shape() {
        // Two rows of 9: bridges at columns 0, 4, 8.
        let map = CouplingMap::heavy_hex(2, 9);
        assert_eq!(map.num_qubits(), 21);
        assert_eq!(map.num_edges(), 8 + 8 + 3 * 2);
        assert!(map.is_connected(0, 18));
        assert!(map.is_connected(18, 9));
        assert!(map.is_connected(4, 19));
        assert!(map.is_connected(19, 13));

        // Second row gap starts at column 2.
        let map = CouplingMap::heavy_hex(3, 7);
        assert!(map.is_connected(7 + 2, 21 + 2));
        assert!(map.is_connected(21 + 2, 14 + 2));
    }

    #[test]
    fn test_to_graph_indices_match_qubits() {
        let map = CouplingMap::linear(4);
        let graph = map.to_graph();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph[NodeIndex::new(2)], 2);
        assert!(graph.contains_edge(NodeIndex::new(2), NodeIndex::new(3)));
    }
}
