use super::CycleDetector;
use crate::config::DetectorConfig;
use crate::graph::TokenGraph;
use crate::opportunity::{score_cycle, DetectorKind, Opportunity};

/// Finds A -> B -> A round trips
#[derive(Debug, Clone, Default)]
pub struct TwoHopDetector {
    config: DetectorConfig,
}

impl TwoHopDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }
}

impl CycleDetector for TwoHopDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::TwoHop
    }

    fn detect(&self, graph: &TokenGraph, _source: Option<&str>) -> Vec<Opportunity> {
        let mut opportunities = Vec::new();

        if let Err(e) = self.config.validate() {
            tracing::warn!("Two-hop search skipped: {}", e);
            return opportunities;
        }

        if self.config.max_hops < 2 {
            tracing::debug!("Two-hop search skipped: max_hops = {}", self.config.max_hops);
            return opportunities;
        }

        for a in graph.tokens() {
            for (b, _) in graph.successors(a) {
                // Each pair once, rooted at its smaller token
                if b <= a || !graph.has_edge(b, a) {
                    continue;
                }

                let path = vec![a.to_string(), b.to_string(), a.to_string()];
                match score_cycle(graph, &path, DetectorKind::TwoHop, &self.config) {
                    Ok(Some(opportunity)) => opportunities.push(opportunity),
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Skipping two-hop {} <-> {}: {}", a, b, e),
                }
            }
        }

        tracing::debug!("Two-hop search found {} opportunities", opportunities.len());
        opportunities
    }
}
