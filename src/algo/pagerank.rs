//! Personalization- and dangling-aware PageRank by power iteration.
//!
//! The kernel operates directly on the adjacency store's dense index space.
//! A node whose outgoing weight sum is zero is *dangling*: its rank mass is
//! redistributed through the caller-supplied dangling distribution instead
//! of being divided by a zero out-weight.

use crate::graph::{AdjacencyStore, NodeId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tuning knobs for the power iteration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRankConfig {
    /// Damping factor in (0, 1); mass share that follows edges.
    pub alpha: f64,
    /// Iteration cap; the last iterate is returned when it is reached.
    pub max_iter: usize,
    /// L1 convergence threshold, scaled by the node count.
    pub tol: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            alpha: 0.85,
            max_iter: 100,
            tol: 1e-6,
        }
    }
}

/// Result of a power-iteration run.
///
/// Non-convergence is not an error: `scores` always holds the last iterate
/// and `converged` says whether the tolerance was met within `max_iter`.
#[derive(Debug, Clone)]
pub struct PageRankRun {
    /// Score per node slot; vacant slots stay at 0.
    pub scores: Vec<f64>,
    /// Iterations actually performed.
    pub iterations: usize,
    /// True when the L1 criterion was met.
    pub converged: bool,
}

/// Run PageRank over the store.
///
/// `init`, `personalization` and `dangling` are dense vectors sized to the
/// store's slot count, componentwise non-negative and summing to 1. The
/// facade normally compacts before calling, but vacant slots are tolerated:
/// they carry no mass and receive none.
///
/// Each iteration computes, for every node `v`,
///
/// ```text
/// r'[v] = α·Σ r[u]·w(u,v)/S(u)  +  α·D·dangling[v]  +  (1−α)·personalization[v]
/// ```
///
/// where `S(u)` is `u`'s outgoing weight sum, the sum ranges over in-edges
/// of `v` with `S(u) > 0`, and `D` is the mass currently sitting on
/// dangling nodes. Iteration stops when `Σ|Δr| < tol · N`.
pub fn pagerank(
    store: &AdjacencyStore,
    init: &[f64],
    personalization: &[f64],
    dangling: &[f64],
    config: &PageRankConfig,
) -> PageRankRun {
    let slots = store.slot_count();
    debug_assert_eq!(init.len(), slots);
    debug_assert_eq!(personalization.len(), slots);
    debug_assert_eq!(dangling.len(), slots);

    if slots == 0 {
        return PageRankRun {
            scores: Vec::new(),
            iterations: 0,
            converged: true,
        };
    }

    // S(u) per slot; vacant slots report 0 and never act as sources.
    let out_weight: Vec<f64> = (0..slots)
        .map(|i| store.out_weight_sum(NodeId::new(i as u32)))
        .collect();

    let mut rank = init.to_vec();
    let mut next = vec![0.0; slots];
    let threshold = config.tol * slots as f64;

    for iteration in 1..=config.max_iter {
        let dangling_mass: f64 = (0..slots)
            .filter(|&u| out_weight[u] == 0.0)
            .map(|u| rank[u])
            .sum();

        for (v, slot) in next.iter_mut().enumerate() {
            let mut acc = 0.0;
            for edge in store.in_edges(NodeId::new(v as u32)) {
                let u = edge.src.index();
                if out_weight[u] > 0.0 {
                    acc += rank[u] * edge.weight / out_weight[u];
                }
            }
            *slot = config.alpha * acc
                + config.alpha * dangling_mass * dangling[v]
                + (1.0 - config.alpha) * personalization[v];
        }

        let err: f64 = rank
            .iter()
            .zip(next.iter())
            .map(|(old, new)| (old - new).abs())
            .sum();
        std::mem::swap(&mut rank, &mut next);

        if err < threshold {
            debug!(iterations = iteration, err, "pagerank converged");
            return PageRankRun {
                scores: rank,
                iterations: iteration,
                converged: true,
            };
        }
    }

    PageRankRun {
        scores: rank,
        iterations: config.max_iter,
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(n: usize) -> Vec<f64> {
        vec![1.0 / n as f64; n]
    }

    fn run_uniform(store: &AdjacencyStore, config: &PageRankConfig) -> PageRankRun {
        let n = store.slot_count();
        let u = uniform(n);
        pagerank(store, &u, &u, &u, config)
    }

    #[test]
    fn test_empty_graph() {
        let store = AdjacencyStore::new();
        let run = pagerank(&store, &[], &[], &[], &PageRankConfig::default());
        assert!(run.scores.is_empty());
        assert!(run.converged);
    }

    #[test]
    fn test_three_cycle_is_uniform() {
        let mut store = AdjacencyStore::new();
        let a = store.add_node().unwrap();
        let b = store.add_node().unwrap();
        let c = store.add_node().unwrap();
        store.add_edge(a, b, 1.0).unwrap();
        store.add_edge(b, c, 1.0).unwrap();
        store.add_edge(c, a, 1.0).unwrap();

        let config = PageRankConfig {
            tol: 1e-9,
            max_iter: 1000,
            ..Default::default()
        };
        let run = run_uniform(&store, &config);

        assert!(run.converged);
        for score in &run.scores {
            assert!((score - 1.0 / 3.0).abs() < 1e-6, "score={score}");
        }
    }

    #[test]
    fn test_scores_sum_to_one() {
        let mut store = AdjacencyStore::new();
        let ids: Vec<NodeId> = (0..5).map(|_| store.add_node().unwrap()).collect();
        store.add_edge(ids[0], ids[1], 1.0).unwrap();
        store.add_edge(ids[1], ids[2], 2.0).unwrap();
        store.add_edge(ids[2], ids[0], 0.5).unwrap();
        store.add_edge(ids[3], ids[0], 1.0).unwrap();
        // ids[4] dangling

        let config = PageRankConfig::default();
        let run = run_uniform(&store, &config);
        let total: f64 = run.scores.iter().sum();
        assert!((total - 1.0).abs() < 10.0 * config.tol, "sum={total}");
    }

    #[test]
    fn test_chain_sink_collects_most_mass() {
        // 0 -> 1 -> 2 -> 3: the sink outranks every non-sink.
        let mut store = AdjacencyStore::new();
        let ids: Vec<NodeId> = (0..4).map(|_| store.add_node().unwrap()).collect();
        for pair in ids.windows(2) {
            store.add_edge(pair[0], pair[1], 1.0).unwrap();
        }

        let run = run_uniform(&store, &PageRankConfig::default());
        let sink = run.scores[3];
        for &score in &run.scores[..3] {
            assert!(sink > score, "sink={sink} other={score}");
        }
    }

    #[test]
    fn test_alpha_zero_returns_personalization() {
        let mut store = AdjacencyStore::new();
        let a = store.add_node().unwrap();
        let b = store.add_node().unwrap();
        let c = store.add_node().unwrap();
        store.add_edge(a, b, 1.0).unwrap();
        store.add_edge(b, c, 1.0).unwrap();

        let pers = vec![0.0, 1.0, 0.0];
        let init = uniform(3);
        let dang = pers.clone();
        let config = PageRankConfig {
            alpha: 0.0,
            ..Default::default()
        };
        let run = pagerank(&store, &init, &pers, &dang, &config);

        assert_eq!(run.scores, pers);
    }

    #[test]
    fn test_weight_scaling_invariant() {
        // Doubling all weights changes nothing: mass splits by ratio.
        let mut store = AdjacencyStore::new();
        let ids: Vec<NodeId> = (0..3).map(|_| store.add_node().unwrap()).collect();
        store.add_edge(ids[0], ids[1], 2.0).unwrap();
        store.add_edge(ids[0], ids[2], 1.0).unwrap();
        store.add_edge(ids[1], ids[2], 1.0).unwrap();

        let mut doubled = AdjacencyStore::new();
        let jds: Vec<NodeId> = (0..3).map(|_| doubled.add_node().unwrap()).collect();
        doubled.add_edge(jds[0], jds[1], 4.0).unwrap();
        doubled.add_edge(jds[0], jds[2], 2.0).unwrap();
        doubled.add_edge(jds[1], jds[2], 2.0).unwrap();

        let config = PageRankConfig::default();
        let a = run_uniform(&store, &config);
        let b = run_uniform(&doubled, &config);
        for (x, y) in a.scores.iter().zip(b.scores.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_max_iter_reports_non_convergence() {
        let mut store = AdjacencyStore::new();
        let a = store.add_node().unwrap();
        let b = store.add_node().unwrap();
        store.add_edge(a, b, 1.0).unwrap();
        store.add_edge(b, a, 1.0).unwrap();

        let config = PageRankConfig {
            max_iter: 1,
            tol: 0.0,
            ..Default::default()
        };
        let run = run_uniform(&store, &config);
        assert!(!run.converged);
        assert_eq!(run.iterations, 1);
    }

    #[test]
    fn test_vacant_slots_carry_no_mass() {
        let mut store = AdjacencyStore::new();
        let a = store.add_node().unwrap();
        let b = store.add_node().unwrap();
        let c = store.add_node().unwrap();
        store.add_edge(a, c, 1.0).unwrap();
        store.add_edge(c, a, 1.0).unwrap();
        store.remove_node(b).unwrap();

        // Distributions put nothing on the vacant slot.
        let dist = vec![0.5, 0.0, 0.5];
        let run = pagerank(&store, &dist, &dist, &dist, &PageRankConfig::default());
        assert_eq!(run.scores[b.index()], 0.0);
        let total: f64 = run.scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
    }
}
