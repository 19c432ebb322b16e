//! Name-keyed graph facade.
//!
//! [`NamedDiGraph`] is the public face of the crate: every operation is
//! keyed by user-visible strings, which the name registry translates to the
//! dense indices the adjacency store and the PageRank kernel work in.
//! Attributes live entirely at this layer; the core below only ever sees
//! node identity, edge endpoints and the cached edge weight.

use super::property::{PropertyMap, PropertyValue};
use super::registry::NameRegistry;
use super::store::{AdjacencyStore, GraphError, GraphResult};
use super::types::NodeId;
use crate::algo::{pagerank, PageRankConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A copy of a node handed to callers: its name plus its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub name: String,
    pub attrs: PropertyMap,
}

impl NodeView {
    /// Read an attribute, surfacing `AttributeMissing` for unknown keys.
    pub fn attr(&self, key: &str) -> GraphResult<&PropertyValue> {
        self.attrs
            .get(key)
            .ok_or_else(|| GraphError::AttributeMissing(key.to_string()))
    }
}

/// A copy of an edge handed to callers: endpoint names plus attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    pub source: String,
    pub target: String,
    pub attrs: PropertyMap,
}

impl EdgeView {
    /// Read an attribute, surfacing `AttributeMissing` for unknown keys.
    pub fn attr(&self, key: &str) -> GraphResult<&PropertyValue> {
        self.attrs
            .get(key)
            .ok_or_else(|| GraphError::AttributeMissing(key.to_string()))
    }
}

/// Options accepted by [`NamedDiGraph::run_pagerank`].
///
/// The three distributions are name-keyed and normalized by the sum of the
/// provided values; names absent from a map contribute zero. Omitted maps
/// default to uniform (`init_score`, `personalization`) or to a copy of the
/// personalization (`dangling_weight`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRankOptions {
    pub init_score: Option<HashMap<String, f64>>,
    pub personalization: Option<HashMap<String, f64>>,
    pub dangling_weight: Option<HashMap<String, f64>>,
    /// Damping factor.
    pub alpha: f64,
    /// Iteration cap.
    pub max_iter: usize,
    /// L1 convergence threshold, scaled by node count.
    pub tol: f64,
}

impl Default for PageRankOptions {
    fn default() -> Self {
        Self {
            init_score: None,
            personalization: None,
            dangling_weight: None,
            alpha: 0.85,
            max_iter: 100,
            tol: 1e-6,
        }
    }
}

/// Directed simple graph keyed by string names, with attribute storage and
/// an embedded PageRank entry point.
#[derive(Debug, Clone, Default)]
pub struct NamedDiGraph {
    store: AdjacencyStore,
    registry: NameRegistry,
    node_attrs: HashMap<String, PropertyMap>,
    edge_attrs: HashMap<(String, String), PropertyMap>,
}

impl NamedDiGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with a preallocated node table.
    pub fn with_capacity(capacity_hint: usize) -> Self {
        NamedDiGraph {
            store: AdjacencyStore::with_capacity(capacity_hint),
            registry: NameRegistry::new(),
            node_attrs: HashMap::with_capacity(capacity_hint),
            edge_attrs: HashMap::new(),
        }
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.store.num_nodes()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.store.num_edges()
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.registry.contains_node(name)
    }

    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        self.registry.contains_edge(source, target)
    }

    /// Add a node with the given attributes.
    pub fn add_node(&mut self, name: &str, attrs: PropertyMap) -> GraphResult<()> {
        if self.registry.contains_node(name) {
            return Err(GraphError::NodeExists(name.to_string()));
        }
        let id = self.store.add_node()?;
        self.registry.bind(name.to_string(), id);
        self.node_attrs.insert(name.to_string(), attrs);
        Ok(())
    }

    /// Add several nodes, failing on the first duplicate.
    pub fn add_nodes_from<I>(&mut self, nodes: I) -> GraphResult<()>
    where
        I: IntoIterator<Item = (String, PropertyMap)>,
    {
        for (name, attrs) in nodes {
            self.add_node(&name, attrs)?;
        }
        Ok(())
    }

    /// Add an edge, auto-creating missing endpoints with empty attributes.
    ///
    /// The `weight` attribute is cached into the adjacency store: absent
    /// means 0.0, integers widen to float, and a non-numeric string is
    /// rejected before anything is mutated.
    pub fn add_edge(&mut self, source: &str, target: &str, attrs: PropertyMap) -> GraphResult<()> {
        if self.registry.contains_edge(source, target) {
            return Err(GraphError::EdgeExists(
                source.to_string(),
                target.to_string(),
            ));
        }
        let weight = Self::weight_from_attrs(&attrs)?;

        let src = self.ensure_node(source)?;
        let dst = self.ensure_node(target)?;
        self.store.add_edge(src, dst, weight)?;

        self.registry.mark_edge(source, target);
        self.edge_attrs
            .insert((source.to_string(), target.to_string()), attrs);
        Ok(())
    }

    /// Add several edges, failing on the first duplicate.
    pub fn add_edges_from<I>(&mut self, edges: I) -> GraphResult<()>
    where
        I: IntoIterator<Item = (String, String, PropertyMap)>,
    {
        for (source, target, attrs) in edges {
            self.add_edge(&source, &target, attrs)?;
        }
        Ok(())
    }

    /// Replace a node's attribute map.
    pub fn update_node(&mut self, name: &str, attrs: PropertyMap) -> GraphResult<()> {
        if !self.registry.contains_node(name) {
            return Err(GraphError::NodeMissing(name.to_string()));
        }
        self.node_attrs.insert(name.to_string(), attrs);
        Ok(())
    }

    /// Replace an edge's attribute map and re-cache its weight.
    pub fn update_edge(
        &mut self,
        source: &str,
        target: &str,
        attrs: PropertyMap,
    ) -> GraphResult<()> {
        if !self.registry.contains_edge(source, target) {
            return Err(GraphError::EdgeMissing(
                source.to_string(),
                target.to_string(),
            ));
        }
        let weight = Self::weight_from_attrs(&attrs)?;
        let src = self.index_of(source)?;
        let dst = self.index_of(target)?;
        self.store.update_weight(src, dst, weight)?;
        self.edge_attrs
            .insert((source.to_string(), target.to_string()), attrs);
        Ok(())
    }

    /// Remove a node and every edge incident to it.
    pub fn remove_node(&mut self, name: &str) -> GraphResult<()> {
        let id = self
            .registry
            .index_of(name)
            .ok_or_else(|| GraphError::NodeMissing(name.to_string()))?;

        let doomed: Vec<(String, String)> = self
            .registry
            .edge_pairs()
            .filter(|(s, t)| s == name || t == name)
            .cloned()
            .collect();
        for (s, t) in &doomed {
            self.registry.unmark_edge(s, t);
            self.edge_attrs.remove(&(s.clone(), t.clone()));
        }

        self.store.remove_node(id)?;
        self.registry.unbind(name);
        self.node_attrs.remove(name);
        Ok(())
    }

    /// Remove the edge `source -> target`.
    pub fn remove_edge(&mut self, source: &str, target: &str) -> GraphResult<()> {
        if !self.registry.contains_edge(source, target) {
            return Err(GraphError::EdgeMissing(
                source.to_string(),
                target.to_string(),
            ));
        }
        let src = self.index_of(source)?;
        let dst = self.index_of(target)?;
        self.store.remove_edge(src, dst)?;
        self.registry.unmark_edge(source, target);
        self.edge_attrs
            .remove(&(source.to_string(), target.to_string()));
        Ok(())
    }

    /// Get a node by name, with a copy of its attributes.
    pub fn get_node(&self, name: &str) -> GraphResult<NodeView> {
        if !self.registry.contains_node(name) {
            return Err(GraphError::NodeMissing(name.to_string()));
        }
        Ok(NodeView {
            name: name.to_string(),
            attrs: self.node_attrs.get(name).cloned().unwrap_or_default(),
        })
    }

    /// Get an edge by endpoint names, with a copy of its attributes.
    pub fn get_edge(&self, source: &str, target: &str) -> GraphResult<EdgeView> {
        if !self.registry.contains_edge(source, target) {
            return Err(GraphError::EdgeMissing(
                source.to_string(),
                target.to_string(),
            ));
        }
        Ok(EdgeView {
            source: source.to_string(),
            target: target.to_string(),
            attrs: self
                .edge_attrs
                .get(&(source.to_string(), target.to_string()))
                .cloned()
                .unwrap_or_default(),
        })
    }

    /// All node names in creation order (index order).
    pub fn node_list(&self) -> Vec<String> {
        let mut pairs: Vec<(NodeId, &String)> = self
            .registry
            .bindings()
            .map(|(name, id)| (id, name))
            .collect();
        pairs.sort_by_key(|(id, _)| *id);
        pairs.into_iter().map(|(_, name)| name.clone()).collect()
    }

    /// All `(source, target)` name pairs, sorted for determinism.
    pub fn edge_list(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self.registry.edge_pairs().cloned().collect();
        pairs.sort();
        pairs
    }

    /// Pack the node index space and rebind names to the new indices.
    pub fn compact_node_array(&mut self) {
        if self.store.is_compact() {
            return;
        }
        let before = self.store.slot_count();
        self.store.compact_nodes();
        self.registry.rebind_after_compaction();
        debug!(
            slots_before = before,
            nodes = self.store.num_nodes(),
            "compacted node index space"
        );
    }

    /// Drop all nodes, edges and attributes.
    pub fn clear(&mut self) {
        self.store.clear();
        self.registry.clear();
        self.node_attrs.clear();
        self.edge_attrs.clear();
    }

    /// Run PageRank and return `name -> score`.
    ///
    /// Compacts the index space first if needed, builds the dense input
    /// vectors from the name-keyed options, invokes the kernel, and re-keys
    /// the result by name. Non-convergence returns the last iterate.
    pub fn run_pagerank(&mut self, options: &PageRankOptions) -> GraphResult<HashMap<String, f64>> {
        let n = self.store.num_nodes();
        if n == 0 {
            return Ok(HashMap::new());
        }
        self.compact_node_array();

        let init = self.build_distribution(options.init_score.as_ref())?;
        let personalization = self.build_distribution(options.personalization.as_ref())?;
        let dangling = match &options.dangling_weight {
            Some(map) => self.build_distribution(Some(map))?,
            None => personalization.clone(),
        };

        let config = PageRankConfig {
            alpha: options.alpha,
            max_iter: options.max_iter,
            tol: options.tol,
        };
        let run = pagerank(&self.store, &init, &personalization, &dangling, &config);
        if !run.converged {
            warn!(
                iterations = run.iterations,
                tol = options.tol,
                "pagerank hit the iteration cap before converging"
            );
        }

        let mut scores = HashMap::with_capacity(n);
        for (name, id) in self.registry.bindings() {
            scores.insert(name.clone(), run.scores[id.index()]);
        }
        Ok(scores)
    }

    /// Borrow the underlying adjacency store (read-only).
    pub fn store(&self) -> &AdjacencyStore {
        &self.store
    }

    /// Current dense index of a node. Invalidated by compaction.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.registry.index_of(name)
    }

    fn index_of(&self, name: &str) -> GraphResult<NodeId> {
        self.registry
            .index_of(name)
            .ok_or_else(|| GraphError::NodeMissing(name.to_string()))
    }

    fn ensure_node(&mut self, name: &str) -> GraphResult<NodeId> {
        if let Some(id) = self.registry.index_of(name) {
            return Ok(id);
        }
        let id = self.store.add_node()?;
        self.registry.bind(name.to_string(), id);
        self.node_attrs.insert(name.to_string(), PropertyMap::new());
        Ok(id)
    }

    fn weight_from_attrs(attrs: &PropertyMap) -> GraphResult<f64> {
        match attrs.get("weight") {
            None => Ok(0.0),
            Some(value) => value.to_f64().ok_or_else(|| {
                GraphError::InvalidInput(format!("edge weight '{}' is not numeric", value))
            }),
        }
    }

    /// Turn an optional name-keyed map into a dense distribution.
    ///
    /// Provided maps are divided by the sum of the provided values (names
    /// missing from the map get zero); `None` means uniform over the live
    /// nodes. Called after compaction, so slots and nodes coincide.
    fn build_distribution(&self, provided: Option<&HashMap<String, f64>>) -> GraphResult<Vec<f64>> {
        let len = self.store.slot_count();
        let mut dense = vec![0.0; len];
        match provided {
            None => {
                let uniform = 1.0 / self.store.num_nodes() as f64;
                for slot in &mut dense {
                    *slot = uniform;
                }
            }
            Some(map) => {
                let total: f64 = map.values().sum();
                if !(total > 0.0) || !total.is_finite() {
                    return Err(GraphError::InvalidInput(
                        "distribution sum must be positive and finite".to_string(),
                    ));
                }
                for (name, id) in self.registry.bindings() {
                    if let Some(&mass) = map.get(name) {
                        dense[id.index()] = mass / total;
                    }
                }
            }
        }
        Ok(dense)
    }
}
