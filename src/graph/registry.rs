//! Name registry: the bridge between user-visible strings and dense ids.
//!
//! Kept strictly in sync with the adjacency store by the facade. All
//! duplicate/missing checks run against the registry before the store is
//! touched, so a failed operation leaves both structures unchanged.

use super::types::NodeId;
use std::collections::{HashMap, HashSet};

/// Bidirectional `name -> index` binding plus the set of name pairs that
/// currently carry an edge.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    name_to_index: HashMap<String, NodeId>,
    edges_present: HashSet<(String, String)>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bound names.
    pub fn len(&self) -> usize {
        self.name_to_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_index.is_empty()
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        self.edges_present
            .contains(&(source.to_string(), target.to_string()))
    }

    /// Resolve a name to its current dense index.
    pub fn index_of(&self, name: &str) -> Option<NodeId> {
        self.name_to_index.get(name).copied()
    }

    /// Bind a name to a node id. The caller has already checked uniqueness.
    pub fn bind(&mut self, name: String, id: NodeId) {
        self.name_to_index.insert(name, id);
    }

    /// Drop a name binding.
    pub fn unbind(&mut self, name: &str) -> Option<NodeId> {
        self.name_to_index.remove(name)
    }

    pub fn mark_edge(&mut self, source: &str, target: &str) {
        self.edges_present
            .insert((source.to_string(), target.to_string()));
    }

    pub fn unmark_edge(&mut self, source: &str, target: &str) {
        self.edges_present
            .remove(&(source.to_string(), target.to_string()));
    }

    /// Iterate over all `(name, index)` bindings in arbitrary order.
    pub fn bindings(&self) -> impl Iterator<Item = (&String, NodeId)> {
        self.name_to_index.iter().map(|(name, id)| (name, *id))
    }

    /// Iterate over all `(source, target)` pairs that carry an edge.
    pub fn edge_pairs(&self) -> impl Iterator<Item = &(String, String)> {
        self.edges_present.iter()
    }

    /// Rebind names after the store compacted its node table.
    ///
    /// Compaction packs live nodes into `0..n` preserving relative order, so
    /// sorting the bindings by old index and numbering them in that order
    /// reproduces the store's new assignment without consulting it.
    pub fn rebind_after_compaction(&mut self) {
        let mut pairs: Vec<(String, NodeId)> = self.name_to_index.drain().collect();
        pairs.sort_by_key(|(_, id)| *id);
        for (new_index, (name, _)) in pairs.into_iter().enumerate() {
            self.name_to_index.insert(name, NodeId::new(new_index as u32));
        }
    }

    pub fn clear(&mut self) {
        self.name_to_index.clear();
        self.edges_present.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_resolve() {
        let mut reg = NameRegistry::new();
        reg.bind("a".to_string(), NodeId::new(0));
        reg.bind("b".to_string(), NodeId::new(1));

        assert_eq!(reg.index_of("a"), Some(NodeId::new(0)));
        assert_eq!(reg.index_of("missing"), None);
        assert!(reg.contains_node("b"));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_edge_pairs() {
        let mut reg = NameRegistry::new();
        reg.mark_edge("a", "b");
        assert!(reg.contains_edge("a", "b"));
        assert!(!reg.contains_edge("b", "a"));

        reg.unmark_edge("a", "b");
        assert!(!reg.contains_edge("a", "b"));
    }

    #[test]
    fn test_rebind_after_compaction() {
        // Simulates slots 0, 2, 5 surviving a compaction: order by old
        // index must become the new 0, 1, 2.
        let mut reg = NameRegistry::new();
        reg.bind("first".to_string(), NodeId::new(0));
        reg.bind("middle".to_string(), NodeId::new(2));
        reg.bind("last".to_string(), NodeId::new(5));

        reg.rebind_after_compaction();

        assert_eq!(reg.index_of("first"), Some(NodeId::new(0)));
        assert_eq!(reg.index_of("middle"), Some(NodeId::new(1)));
        assert_eq!(reg.index_of("last"), Some(NodeId::new(2)));
    }
}
