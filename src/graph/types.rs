//! Index newtypes for the dense node and edge arenas.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node slot in the adjacency store.
///
/// Node ids are dense: a node's id is its position in the node table.
/// Deleting a node leaves its slot vacant without disturbing the ids of the
/// surviving nodes; [`compact_nodes`](crate::graph::AdjacencyStore::compact_nodes)
/// reassigns ids to a contiguous prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }

    /// Position of this node's slot in the node table.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        NodeId(id)
    }
}

/// Index of an edge record in the edge arena.
///
/// Edge ids are internal: freed slots are recycled, and the sibling links of
/// the per-source and per-destination chains refer to edges by this index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl EdgeId {
    pub fn new(id: u32) -> Self {
        EdgeId(id)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl From<u32> for EdgeId {
    fn from(id: u32) -> Self {
        EdgeId(id)
    }
}
