//! Lexigraph
//!
//! A name-keyed directed simple graph with an embedded personalized
//! PageRank solver and GraphML serialization.
//!
//! The graph is keyed by user-visible string names. Underneath, a dual-
//! indexed adjacency store keeps every node's incoming and outgoing edges
//! in doubly linked chains over a dense, stable index space, which is what
//! the PageRank kernel iterates over. Deleting nodes leaves vacancies;
//! compaction (automatic before PageRank) packs the survivors back into a
//! contiguous prefix and rebinds their names.
//!
//! # Example
//!
//! ```rust
//! use lexigraph::{NamedDiGraph, PageRankOptions, PropertyMap};
//!
//! let mut graph = NamedDiGraph::new();
//! graph.add_node("a", PropertyMap::new()).unwrap();
//! // Endpoints are auto-created with empty attributes.
//! graph.add_edge("a", "b", PropertyMap::new()).unwrap();
//! graph.add_edge("b", "a", PropertyMap::new()).unwrap();
//!
//! let scores = graph.run_pagerank(&PageRankOptions::default()).unwrap();
//! assert_eq!(scores.len(), 2);
//! let total: f64 = scores.values().sum();
//! assert!((total - 1.0).abs() < 1e-5);
//! ```

#![warn(clippy::all)]

pub mod algo;
pub mod graph;
pub mod io;

// Re-export main types for convenience
pub use algo::{pagerank, PageRankConfig, PageRankRun};
pub use graph::{
    AdjacencyStore, EdgeId, EdgeRecord, EdgeView, GraphError, GraphResult, NameRegistry,
    NamedDiGraph, NodeId, NodeRecord, NodeView, PageRankOptions, PropertyMap, PropertyValue,
};
pub use io::{load_from_file, save_to_file, GraphMlError, GraphMlResult};
