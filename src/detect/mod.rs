//! Cycle Detection
//!
//! Three complementary searches over one immutable [`TokenGraph`]:
//! - Bellman-Ford negative-cycle detection with cycle reconstruction
//! - Triangle (3-cycle) enumeration
//! - Two-hop (2-cycle) enumeration
//!
//! All of them score candidates with [`crate::opportunity::score_cycle`].

mod bellman_ford;
mod triangle;
mod two_hop;

pub use bellman_ford::BellmanFordDetector;
pub use triangle::TriangleDetector;
pub use two_hop::TwoHopDetector;

use crate::graph::TokenGraph;
use crate::opportunity::{DetectorKind, Opportunity};

/// A search that turns a graph into scored opportunities.
///
/// Implementations never mutate the graph and never fail: problems are
/// logged and yield an empty (or partial) result.
pub trait CycleDetector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    /// `source` is only meaningful to searches that start from one token
    fn detect(&self, graph: &TokenGraph, source: Option<&str>) -> Vec<Opportunity>;
}

/// Pick the token with the highest in+out degree; ties go to the
/// lexicographically smallest token
pub fn select_source(graph: &TokenGraph) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for token in graph.tokens() {
        let degree = graph.degree(token);
        if best.map_or(true, |(_, d)| degree > d) {
            best = Some((token, degree));
        }
    }
    best.map(|(token, _)| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, GraphBuilder};

    #[test]
    fn test_select_source_highest_degree() {
        let graph = GraphBuilder::new()
            .build(&[
                Edge::new("A", "HUB", 1.0),
                Edge::new("HUB", "B", 1.0),
                Edge::new("B", "HUB", 1.0),
            ])
            .unwrap();
        assert_eq!(select_source(&graph).as_deref(), Some("HUB"));
    }

    #[test]
    fn test_select_source_tie_breaks_lexicographically() {
        let graph = GraphBuilder::new()
            .build(&[Edge::new("ZED", "ALPHA", 1.0), Edge::new("MID", "BETA", 1.0)])
            .unwrap();
        assert_eq!(select_source(&graph).as_deref(), Some("ALPHA"));
    }

    #[test]
    fn test_select_source_empty_graph() {
        assert_eq!(select_source(&TokenGraph::new()), None);
    }
}
