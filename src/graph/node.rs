//! Node record for the adjacency store.

use super::types::{EdgeId, NodeId};

/// A node slot in the adjacency store.
///
/// A node carries no payload of its own; names and attributes live outside
/// the core. What it does carry is the bookkeeping for its two edge chains:
/// the head of the outgoing chain (linked through `next_same_src`) and the
/// head of the incoming chain (linked through `next_same_dst`), plus the
/// length of each.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    /// Dense id; equals the slot index in the node table.
    pub id: NodeId,

    /// Head of the outgoing edge chain.
    pub(crate) first_out: Option<EdgeId>,

    /// Head of the incoming edge chain.
    pub(crate) first_in: Option<EdgeId>,

    pub(crate) num_out: usize,
    pub(crate) num_in: usize,
}

impl NodeRecord {
    pub(crate) fn new(id: NodeId) -> Self {
        NodeRecord {
            id,
            first_out: None,
            first_in: None,
            num_out: 0,
            num_in: 0,
        }
    }

    /// Number of outgoing edges.
    pub fn out_degree(&self) -> usize {
        self.num_out
    }

    /// Number of incoming edges.
    pub fn in_degree(&self) -> usize {
        self.num_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_isolated() {
        let node = NodeRecord::new(NodeId::new(3));
        assert_eq!(node.id, NodeId::new(3));
        assert_eq!(node.out_degree(), 0);
        assert_eq!(node.in_degree(), 0);
        assert!(node.first_out.is_none());
        assert!(node.first_in.is_none());
    }
}
