//! Arbitrage Coordinator
//!
//! Runs the enabled detectors over one graph, merges their output,
//! collapses duplicates and ranks what is left.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::{DedupStrategy, DetectorConfig};
use crate::detect::{
    select_source, BellmanFordDetector, CycleDetector, TriangleDetector, TwoHopDetector,
};
use crate::graph::TokenGraph;
use crate::opportunity::{canonical_cycle, Opportunity};

pub struct ArbitrageCoordinator {
    config: DetectorConfig,
    detectors: Vec<Box<dyn CycleDetector>>,
}

impl ArbitrageCoordinator {
    /// Coordinator with all three detectors enabled
    pub fn new(config: DetectorConfig) -> Self {
        tracing::info!(
            "Arbitrage coordinator: min profit {:.2}%, max hops {}, base amount {}, dedup {:?}",
            config.min_profit_threshold * 100.0,
            config.max_hops,
            config.base_amount,
            config.dedup
        );

        let detectors: Vec<Box<dyn CycleDetector>> = vec![
            Box::new(BellmanFordDetector::new(config.clone())),
            Box::new(TriangleDetector::new(config.clone())),
            Box::new(TwoHopDetector::new(config.clone())),
        ];

        Self { config, detectors }
    }

    /// Coordinator running only the supplied detectors
    pub fn with_detectors(config: DetectorConfig, detectors: Vec<Box<dyn CycleDetector>>) -> Self {
        Self { config, detectors }
    }

    pub fn with_bellman_ford(self, enabled: bool) -> Self {
        let config = self.config.clone();
        self.toggle(enabled, move || Box::new(BellmanFordDetector::new(config)))
    }

    pub fn with_triangle(self, enabled: bool) -> Self {
        let config = self.config.clone();
        self.toggle(enabled, move || Box::new(TriangleDetector::new(config)))
    }

    pub fn with_two_hop(self, enabled: bool) -> Self {
        let config = self.config.clone();
        self.toggle(enabled, move || Box::new(TwoHopDetector::new(config)))
    }

    fn toggle(
        mut self,
        enabled: bool,
        make: impl FnOnce() -> Box<dyn CycleDetector>,
    ) -> Self {
        let detector = make();
        let kind = detector.kind();
        let present = self.detectors.iter().any(|d| d.kind() == kind);

        if enabled && !present {
            self.detectors.push(detector);
        } else if !enabled {
            self.detectors.retain(|d| d.kind() != kind);
        }
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect, deduplicate and rank opportunities in `graph`
    pub fn detect(&self, graph: &TokenGraph, source: Option<&str>) -> Vec<Opportunity> {
        if graph.is_empty() {
            tracing::warn!("Graph is empty, cannot detect arbitrage");
            return Vec::new();
        }

        if let Err(e) = self.config.validate() {
            tracing::warn!("Arbitrage detection skipped: {}", e);
            return Vec::new();
        }

        tracing::info!("Starting arbitrage detection: {}", graph.stats());

        let source = match source {
            Some(token) => Some(token.to_string()),
            None => {
                let selected = select_source(graph);
                if let Some(token) = &selected {
                    tracing::info!(
                        "Automatically selected source token {} (degree {})",
                        token,
                        graph.degree(token)
                    );
                }
                selected
            }
        };

        let mut opportunities = Vec::new();
        for detector in &self.detectors {
            let found = detector.detect(graph, source.as_deref());
            tracing::info!("{} found {} opportunities", detector.kind(), found.len());
            opportunities.extend(found);
        }

        let ranked = deduplicate_and_rank(opportunities, self.config.dedup);
        tracing::info!("Total {} unique arbitrage opportunities", ranked.len());
        ranked
    }
}

/// Key under which two opportunities count as the same trade
fn dedup_key(opportunity: &Opportunity, strategy: DedupStrategy) -> Vec<String> {
    match strategy {
        DedupStrategy::TokenSet => {
            let body = &opportunity.path[..opportunity.path.len().saturating_sub(1)];
            let mut tokens = body.to_vec();
            tokens.sort();
            tokens.dedup();
            tokens
        }
        DedupStrategy::OrderedPath => canonical_cycle(&opportunity.path),
    }
}

/// Keep the most profitable opportunity per key, then order by
/// profit ratio and confidence, both descending
pub fn deduplicate_and_rank(
    opportunities: Vec<Opportunity>,
    strategy: DedupStrategy,
) -> Vec<Opportunity> {
    let mut slots: HashMap<Vec<String>, usize> = HashMap::new();
    let mut unique: Vec<Opportunity> = Vec::new();

    for opportunity in opportunities {
        let key = dedup_key(&opportunity, strategy);
        match slots.get(&key) {
            Some(&slot) => {
                if opportunity.profit_ratio > unique[slot].profit_ratio {
                    unique[slot] = opportunity;
                }
            }
            None => {
                slots.insert(key, unique.len());
                unique.push(opportunity);
            }
        }
    }

    unique.sort_by(|a, b| {
        b.profit_ratio
            .partial_cmp(&a.profit_ratio)
            .unwrap_or(Ordering::Equal)
            .then(
                b.confidence_score
                    .partial_cmp(&a.confidence_score)
                    .unwrap_or(Ordering::Equal),
            )
    });

    unique
}

/// Log a ranked report of the best opportunities
pub fn log_opportunities(opportunities: &[Opportunity], max_display: usize) {
    if opportunities.is_empty() {
        tracing::info!("No arbitrage opportunities found");
        return;
    }

    tracing::info!(
        "Arbitrage opportunity report (top {} of {}):",
        opportunities.len().min(max_display),
        opportunities.len()
    );
    for (i, opp) in opportunities.iter().take(max_display).enumerate() {
        tracing::info!("{:2}. {}", i + 1, opp.summary());
    }
}

/// Run every detector with default settings and the given profit floor
pub fn detect_arbitrage(graph: &TokenGraph, min_profit: f64) -> Vec<Opportunity> {
    let config = DetectorConfig {
        min_profit_threshold: min_profit,
        ..DetectorConfig::default()
    };
    ArbitrageCoordinator::new(config).detect(graph, None)
}
