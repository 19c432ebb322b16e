//! Core graph implementation.
//!
//! Layered bottom-up: edge and node records, the dual-indexed adjacency
//! store that owns them, the name registry that maps user strings onto the
//! dense index space, and the name-keyed facade that ties them together.

pub mod edge;
pub mod named;
pub mod node;
pub mod property;
pub mod registry;
pub mod store;
pub mod types;

// Re-export main types
pub use edge::EdgeRecord;
pub use named::{EdgeView, NamedDiGraph, NodeView, PageRankOptions};
pub use node::NodeRecord;
pub use property::{PropertyMap, PropertyValue};
pub use registry::NameRegistry;
pub use store::{AdjacencyStore, GraphError, GraphResult, InEdges, OutEdges};
pub use types::{EdgeId, NodeId};
