use super::CycleDetector;
use crate::config::DetectorConfig;
use crate::graph::TokenGraph;
use crate::opportunity::{score_cycle, DetectorKind, Opportunity};

/// Enumerates simple 3-cycles A -> B -> C -> A.
///
/// Cost is O(V * max_out_degree^2): fine for a few dozen tokens, not for
/// thousands.
#[derive(Debug, Clone, Default)]
pub struct TriangleDetector {
    config: DetectorConfig,
}

impl TriangleDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }
}

impl CycleDetector for TriangleDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Triangle
    }

    fn detect(&self, graph: &TokenGraph, _source: Option<&str>) -> Vec<Opportunity> {
        let mut opportunities = Vec::new();

        if let Err(e) = self.config.validate() {
            tracing::warn!("Triangle search skipped: {}", e);
            return opportunities;
        }

        if self.config.max_hops < 3 {
            tracing::debug!("Triangle search skipped: max_hops = {}", self.config.max_hops);
            return opportunities;
        }

        let mut candidates = 0usize;
        for a in graph.tokens() {
            for (b, _) in graph.successors(a) {
                // A is the smallest token of the cycle: each rotation is visited once
                if b <= a {
                    continue;
                }
                for (c, _) in graph.successors(b) {
                    if c <= a || c == b || !graph.has_edge(c, a) {
                        continue;
                    }

                    candidates += 1;
                    let path = vec![a.to_string(), b.to_string(), c.to_string(), a.to_string()];
                    match score_cycle(graph, &path, DetectorKind::Triangle, &self.config) {
                        Ok(Some(opportunity)) => opportunities.push(opportunity),
                        Ok(None) => {}
                        Err(e) => tracing::warn!("Skipping triangle {:?}: {}", path, e),
                    }
                }
            }
        }

        tracing::debug!(
            "Triangle search scored {} candidates, kept {}",
            candidates,
            opportunities.len()
        );
        opportunities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, GraphBuilder};

    fn sol_usdc_usdt() -> TokenGraph {
        GraphBuilder::new()
            .build(&[
                Edge::new("SOL", "USDC", 180.0),
                Edge::new("USDC", "USDT", 1.03),
                Edge::new("USDT", "SOL", 0.0065),
            ])
            .unwrap()
    }

    #[test]
    fn test_single_triangle_reported_once() {
        let graph = sol_usdc_usdt();
        let opps = TriangleDetector::new(DetectorConfig::default()).detect(&graph, None);

        assert_eq!(opps.len(), 1);
        let opp = &opps[0];
        assert_eq!(opp.path, vec!["SOL", "USDC", "USDT", "SOL"]);
        assert_eq!(opp.hop_count, 3);
        assert!(opp.total_weight < 0.0);
        assert!((opp.profit_ratio - ((-opp.total_weight).exp() - 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_both_directions_are_distinct() {
        let graph = GraphBuilder::new()
            .build(&[
                Edge::new("A", "B", 1.1),
                Edge::new("B", "C", 1.1),
                Edge::new("C", "A", 1.1),
                Edge::new("A", "C", 1.1),
                Edge::new("C", "B", 1.1),
                Edge::new("B", "A", 1.1),
            ])
            .unwrap();
        let opps = TriangleDetector::new(DetectorConfig::default()).detect(&graph, None);
        let paths: Vec<_> = opps.iter().map(|o| o.path.join("")).collect();
        assert_eq!(paths, vec!["ABCA", "ACBA"]);
    }

    #[test]
    fn test_unprofitable_triangle_dropped() {
        let graph = GraphBuilder::new()
            .build(&[
                Edge::new("A", "B", 2.0),
                Edge::new("B", "C", 3.0),
                Edge::new("C", "A", 1.0 / 6.0),
            ])
            .unwrap();
        assert!(TriangleDetector::new(DetectorConfig::default())
            .detect(&graph, None)
            .is_empty());
    }

    #[test]
    fn test_deterministic() {
        let graph = sol_usdc_usdt();
        let detector = TriangleDetector::new(DetectorConfig::default());
        assert_eq!(detector.detect(&graph, None), detector.detect(&graph, None));
    }
}
