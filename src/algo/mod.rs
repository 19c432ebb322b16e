//! Graph algorithms.
//!
//! PageRank is the only resident; it reads the adjacency store's dense
//! index space directly, so callers compact the node table first (the
//! facade does this automatically).

pub mod pagerank;

pub use pagerank::{pagerank, PageRankConfig, PageRankRun};
