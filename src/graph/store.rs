//! In-memory adjacency storage.
//!
//! The store owns two arenas: a node table whose slot index IS the node id,
//! and an edge arena threaded by two doubly linked chains per node (one for
//! outgoing edges, one for incoming). Head insertion and unsplicing are O(1);
//! removing an edge by its endpoints costs a walk of the shorter chain.
//!
//! Deleting a node leaves its slot vacant so that the surviving ids stay
//! valid; [`AdjacencyStore::compact_nodes`] packs the live nodes back into a
//! contiguous prefix for the vector-based algorithms.

use super::edge::EdgeRecord;
use super::node::NodeRecord;
use super::types::{EdgeId, NodeId};
use thiserror::Error;

/// Errors that can occur during graph operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A node with this name is already present.
    #[error("node '{0}' already exists")]
    NodeExists(String),

    /// No node with this name.
    #[error("node '{0}' not found")]
    NodeMissing(String),

    /// An edge between these names is already present.
    #[error("edge '{0}' -> '{1}' already exists")]
    EdgeExists(String, String),

    /// No edge between these names.
    #[error("edge '{0}' -> '{1}' not found")]
    EdgeMissing(String, String),

    /// An endpoint id does not refer to a live node slot.
    #[error("endpoint {0} is not a live node")]
    UnknownEndpoint(NodeId),

    /// The ordered endpoint pair already carries an edge.
    #[error("duplicate edge {0} -> {1}")]
    DuplicateEdge(NodeId, NodeId),

    /// The ordered endpoint pair carries no edge.
    #[error("edge {0} -> {1} not found")]
    EdgeNotFound(NodeId, NodeId),

    /// A growth operation could not reserve memory.
    #[error("allocation failed while growing the graph")]
    AllocationFailed,

    /// An attribute key was read that the element does not carry.
    #[error("attribute '{0}' not found")]
    AttributeMissing(String),

    /// A caller-supplied value violates the operation's contract.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Dual-indexed adjacency storage for a directed simple graph.
///
/// - `nodes`: slot table; `None` marks a vacancy left by a removed node.
///   Slots are never reused before a compaction, which is what keeps ids
///   stable for outside holders.
/// - `edges`: arena with a free list; chain links refer to edges by arena
///   index, so they survive node-table compaction unchanged.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyStore {
    nodes: Vec<Option<NodeRecord>>,
    edges: Vec<Option<EdgeRecord>>,
    free_edges: Vec<EdgeId>,
    num_nodes: usize,
    num_edges: usize,
}

impl AdjacencyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with a preallocated node table.
    ///
    /// The hint only reserves capacity; `num_nodes` starts at zero and the
    /// table grows past the hint as needed.
    pub fn with_capacity(capacity_hint: usize) -> Self {
        AdjacencyStore {
            nodes: Vec::with_capacity(capacity_hint),
            edges: Vec::with_capacity(capacity_hint * 2),
            free_edges: Vec::new(),
            num_nodes: 0,
            num_edges: 0,
        }
    }

    /// Number of live nodes.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Length of the node table, vacant slots included.
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    /// True when live node ids form exactly `0..num_nodes`.
    pub fn is_compact(&self) -> bool {
        self.num_nodes == self.nodes.len()
    }

    /// Append a new live node and return its id.
    pub fn add_node(&mut self) -> GraphResult<NodeId> {
        self.nodes
            .try_reserve(1)
            .map_err(|_| GraphError::AllocationFailed)?;
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(Some(NodeRecord::new(id)));
        self.num_nodes += 1;
        Ok(id)
    }

    /// Get a live node by id.
    pub fn get_node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id.index()).and_then(|slot| slot.as_ref())
    }

    /// Iterate over the ids of all live nodes, ascending.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter_map(|slot| slot.as_ref().map(|n| n.id))
    }

    /// Insert an edge `src -> dst`, splicing it at the head of both chains.
    ///
    /// Walks `src`'s outgoing chain first to enforce the simple-digraph
    /// invariant, so the cost is O(out-degree of src).
    pub fn add_edge(&mut self, src: NodeId, dst: NodeId, weight: f64) -> GraphResult<EdgeId> {
        if self.get_node(src).is_none() {
            return Err(GraphError::UnknownEndpoint(src));
        }
        if self.get_node(dst).is_none() {
            return Err(GraphError::UnknownEndpoint(dst));
        }
        if self.locate_edge(src, dst).is_some() {
            return Err(GraphError::DuplicateEdge(src, dst));
        }

        let eid = match self.free_edges.pop() {
            Some(eid) => {
                self.edges[eid.index()] = Some(EdgeRecord::new(src, dst, weight));
                eid
            }
            None => {
                self.edges
                    .try_reserve(1)
                    .map_err(|_| GraphError::AllocationFailed)?;
                let eid = EdgeId::new(self.edges.len() as u32);
                self.edges.push(Some(EdgeRecord::new(src, dst, weight)));
                eid
            }
        };

        let old_out = self.get_node(src).and_then(|n| n.first_out);
        if let Some(head) = old_out {
            self.edge_mut(head).prev_same_src = Some(eid);
        }
        self.edge_mut(eid).next_same_src = old_out;
        if let Some(n) = self.node_mut(src) {
            n.first_out = Some(eid);
            n.num_out += 1;
        }

        let old_in = self.get_node(dst).and_then(|n| n.first_in);
        if let Some(head) = old_in {
            self.edge_mut(head).prev_same_dst = Some(eid);
        }
        self.edge_mut(eid).next_same_dst = old_in;
        if let Some(n) = self.node_mut(dst) {
            n.first_in = Some(eid);
            n.num_in += 1;
        }

        self.num_edges += 1;
        Ok(eid)
    }

    /// Look up the edge `src -> dst`.
    pub fn get_edge(&self, src: NodeId, dst: NodeId) -> Option<&EdgeRecord> {
        self.locate_edge(src, dst).map(|eid| self.edge_ref(eid))
    }

    /// Replace the cached weight of the edge `src -> dst`.
    pub fn update_weight(&mut self, src: NodeId, dst: NodeId, weight: f64) -> GraphResult<()> {
        let eid = self
            .locate_edge(src, dst)
            .ok_or(GraphError::EdgeNotFound(src, dst))?;
        self.edge_mut(eid).weight = weight;
        Ok(())
    }

    /// Remove the edge `src -> dst`, unsplicing it from both chains.
    pub fn remove_edge(&mut self, src: NodeId, dst: NodeId) -> GraphResult<()> {
        let eid = self
            .locate_edge(src, dst)
            .ok_or(GraphError::EdgeNotFound(src, dst))?;

        self.unsplice_from_src_chain(eid);
        self.unsplice_from_dst_chain(eid);
        if let Some(n) = self.node_mut(src) {
            n.num_out -= 1;
        }
        if let Some(n) = self.node_mut(dst) {
            n.num_in -= 1;
        }
        self.release_edge(eid);
        Ok(())
    }

    /// Remove a node and every edge incident to it.
    ///
    /// The slot is left vacant; other nodes keep their ids.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<()> {
        let first_out = match self.get_node(id) {
            Some(n) => n.first_out,
            None => return Err(GraphError::UnknownEndpoint(id)),
        };

        // Outgoing chain: detach each edge from its destination's incoming
        // chain and free it. A self-loop leaves this node's own incoming
        // chain here, so the second walk never sees it.
        let mut cur = first_out;
        while let Some(eid) = cur {
            let (next, dst) = {
                let e = self.edge_ref(eid);
                (e.next_same_src, e.dst)
            };
            self.unsplice_from_dst_chain(eid);
            if let Some(n) = self.node_mut(dst) {
                n.num_in -= 1;
            }
            self.release_edge(eid);
            cur = next;
        }

        // Incoming chain: everything left has a foreign source.
        let mut cur = self.get_node(id).and_then(|n| n.first_in);
        while let Some(eid) = cur {
            let (next, src) = {
                let e = self.edge_ref(eid);
                (e.next_same_dst, e.src)
            };
            self.unsplice_from_src_chain(eid);
            if let Some(n) = self.node_mut(src) {
                n.num_out -= 1;
            }
            self.release_edge(eid);
            cur = next;
        }

        self.nodes[id.index()] = None;
        self.num_nodes -= 1;
        Ok(())
    }

    /// Iterate over a node's outgoing edges. Empty for a vacant slot.
    pub fn out_edges(&self, id: NodeId) -> OutEdges<'_> {
        OutEdges {
            store: self,
            cur: self.get_node(id).and_then(|n| n.first_out),
        }
    }

    /// Iterate over a node's incoming edges. Empty for a vacant slot.
    pub fn in_edges(&self, id: NodeId) -> InEdges<'_> {
        InEdges {
            store: self,
            cur: self.get_node(id).and_then(|n| n.first_in),
        }
    }

    /// Sum of outgoing edge weights. Zero means the node is dangling.
    pub fn out_weight_sum(&self, id: NodeId) -> f64 {
        self.out_edges(id).map(|e| e.weight).sum()
    }

    /// Pack live nodes into the prefix `0..num_nodes`, preserving their
    /// relative order, and rewrite every edge's endpoints to the new ids.
    ///
    /// Chain links are edge-arena indices and stay untouched. Any node id
    /// held outside the store is invalidated; callers keeping a name map
    /// must rebind it afterwards.
    pub fn compact_nodes(&mut self) {
        if self.is_compact() {
            return;
        }

        let mut remap: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut next = 0u32;
        for (old, slot) in self.nodes.iter().enumerate() {
            if slot.is_some() {
                remap[old] = Some(NodeId::new(next));
                next += 1;
            }
        }

        let mut packed: Vec<Option<NodeRecord>> = Vec::with_capacity(self.num_nodes);
        for slot in self.nodes.drain(..) {
            if let Some(mut node) = slot {
                node.id = remap[node.id.index()].expect("live node has a remap entry");
                packed.push(Some(node));
            }
        }
        self.nodes = packed;

        for slot in self.edges.iter_mut() {
            if let Some(edge) = slot {
                edge.src = remap[edge.src.index()].expect("edge source is live");
                edge.dst = remap[edge.dst.index()].expect("edge destination is live");
            }
        }
    }

    /// Drop all nodes and edges.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.free_edges.clear();
        self.num_nodes = 0;
        self.num_edges = 0;
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeRecord> {
        self.nodes.get_mut(id.index()).and_then(|slot| slot.as_mut())
    }

    fn edge_ref(&self, eid: EdgeId) -> &EdgeRecord {
        self.edges[eid.index()].as_ref().expect("edge arena slot in use")
    }

    fn edge_mut(&mut self, eid: EdgeId) -> &mut EdgeRecord {
        self.edges[eid.index()].as_mut().expect("edge arena slot in use")
    }

    /// Find `src -> dst` by walking the shorter of the two chains.
    fn locate_edge(&self, src: NodeId, dst: NodeId) -> Option<EdgeId> {
        let s = self.get_node(src)?;
        let d = self.get_node(dst)?;
        if s.num_out <= d.num_in {
            let mut cur = s.first_out;
            while let Some(eid) = cur {
                let e = self.edge_ref(eid);
                if e.dst == dst {
                    return Some(eid);
                }
                cur = e.next_same_src;
            }
        } else {
            let mut cur = d.first_in;
            while let Some(eid) = cur {
                let e = self.edge_ref(eid);
                if e.src == src {
                    return Some(eid);
                }
                cur = e.next_same_dst;
            }
        }
        None
    }

    fn unsplice_from_src_chain(&mut self, eid: EdgeId) {
        let (prev, next, src) = {
            let e = self.edge_ref(eid);
            (e.prev_same_src, e.next_same_src, e.src)
        };
        match prev {
            Some(p) => self.edge_mut(p).next_same_src = next,
            None => {
                if let Some(n) = self.node_mut(src) {
                    n.first_out = next;
                }
            }
        }
        if let Some(nx) = next {
            self.edge_mut(nx).prev_same_src = prev;
        }
    }

    fn unsplice_from_dst_chain(&mut self, eid: EdgeId) {
        let (prev, next, dst) = {
            let e = self.edge_ref(eid);
            (e.prev_same_dst, e.next_same_dst, e.dst)
        };
        match prev {
            Some(p) => self.edge_mut(p).next_same_dst = next,
            None => {
                if let Some(n) = self.node_mut(dst) {
                    n.first_in = next;
                }
            }
        }
        if let Some(nx) = next {
            self.edge_mut(nx).prev_same_dst = prev;
        }
    }

    fn release_edge(&mut self, eid: EdgeId) {
        self.edges[eid.index()] = None;
        self.free_edges.push(eid);
        self.num_edges -= 1;
    }
}

/// Iterator over an outgoing chain.
pub struct OutEdges<'a> {
    store: &'a AdjacencyStore,
    cur: Option<EdgeId>,
}

impl<'a> Iterator for OutEdges<'a> {
    type Item = &'a EdgeRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let eid = self.cur?;
        let store: &'a AdjacencyStore = self.store;
        let edge = store.edge_ref(eid);
        self.cur = edge.next_same_src;
        Some(edge)
    }
}

/// Iterator over an incoming chain.
pub struct InEdges<'a> {
    store: &'a AdjacencyStore,
    cur: Option<EdgeId>,
}

impl<'a> Iterator for InEdges<'a> {
    type Item = &'a EdgeRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let eid = self.cur?;
        let store: &'a AdjacencyStore = self.store;
        let edge = store.edge_ref(eid);
        self.cur = edge.next_same_dst;
        Some(edge)
    }
}
