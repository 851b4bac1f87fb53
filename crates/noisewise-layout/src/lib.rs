//! Noise-aware zigzag qubit layout selection.
//!
//! Maps a fixed "zigzag" two-chain interaction pattern onto a processor's
//! coupling graph and ranks the candidate placements by calibrated error
//! rates.
//!
//! # Pipeline
//!
//! ```text
//! BackendProperties ──► coupling() ──► CouplingMap (undirected, de-duplicated)
//!                                          │
//!                       build_zigzag_pattern (widest pattern that embeds)
//!                                          │
//!                       find_layouts (VF2 subgraph isomorphism, petgraph)
//!                                          │
//!                       score_layouts (Σ 2q gate error + Σ readout error)
//!                                          │
//!                                          ▼
//!                                    ZigzagLayout
//! ```
//!
//! # Example
//!
//! ```rust
//! use noisewise_layout::{BackendProperties, ScoringFilter, ZigzagOptions, zigzag_layout};
//!
//! let json = r#"{
//!     "name": "tiny",
//!     "num_qubits": 5,
//!     "basis_gates": ["cz", "rz", "sx"],
//!     "coupling_map": [[0, 1], [1, 2], [2, 3], [3, 4]],
//!     "gate_errors": [
//!         {"gate": "cz", "qubits": [0, 1], "error": 0.01},
//!         {"gate": "cz", "qubits": [1, 2], "error": 0.01},
//!         {"gate": "cz", "qubits": [2, 3], "error": 0.01},
//!         {"gate": "cz", "qubits": [3, 4], "error": 0.01}
//!     ],
//!     "readout_errors": [0.02, 0.01, 0.01, 0.01, 0.02]
//! }"#;
//! let props = BackendProperties::from_json_str(json).unwrap();
//!
//! // One orbital per chain: the two chain qubits meet through a bridge qubit.
//! let options = ZigzagOptions::new(1).with_filter(ScoringFilter::new().with_bad_qubit(0));
//! let layout = zigzag_layout(&props, &options).unwrap();
//! assert_eq!(layout.initial_layout.len(), 2);
//! assert_eq!(layout.num_bridge_qubits, 1);
//! assert!(!layout.initial_layout.contains(&0));
//! ```

pub mod backend;
pub mod coupling;
pub mod error;
pub mod scoring;
pub mod select;
pub mod zigzag;

pub use backend::{BackendProperties, GateError, TWO_QUBIT_GATES};
pub use coupling::CouplingMap;
pub use error::{LayoutError, LayoutResult};
pub use scoring::{ScoredLayout, ScoringFilter, score_layout, score_layouts};
pub use select::{ZigzagLayout, ZigzagOptions, zigzag_layout};
pub use zigzag::{ZigzagPattern, build_zigzag_pattern, find_layouts, linear_chains};
