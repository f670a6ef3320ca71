//! Bellman-Ford negative-cycle detection
//!
//! 1. Relax every edge |V|-1 times from a source token
//! 2. One more pass flags every node that can still be relaxed
//! 3. Each flagged node is turned into a concrete cycle:
//!    - walk the predecessor chain until it loops (cheap, usually enough)
//!    - otherwise a hop-bounded DFS from the flagged node (shortest cycle wins)
//!    - otherwise a DFS from every other node for a cycle through it
//!
//!    Both DFS stages share a per-node expansion budget.
//! 4. Every cycle is scored; failures are isolated to their flagged node.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::{select_source, CycleDetector};
use crate::config::DetectorConfig;
use crate::error::{DetectorError, Result};
use crate::graph::{adjusted_weight, TokenGraph};
use crate::opportunity::{canonical_cycle, score_cycle, DetectorKind, Opportunity};

/// A closed cycle must sum below this to count as negative (absorbs float noise)
const NEGATIVE_CYCLE_EPSILON: f64 = -1e-10;

/// Index-based view of the graph used during one detection pass
struct Relaxation<'g> {
    tokens: Vec<&'g str>,
    /// successors[u] = (v, adjusted weight of u -> v), ordered by v
    successors: Vec<Vec<(usize, f64)>>,
    predecessor: Vec<Option<usize>>,
    /// Nodes still relaxable after |V|-1 passes, ascending
    flagged: BTreeSet<usize>,
}

impl<'g> Relaxation<'g> {
    fn run(graph: &'g TokenGraph, source: &str) -> Option<Self> {
        let tokens: Vec<&str> = graph.tokens().collect();
        let index: HashMap<&str, usize> = tokens.iter().enumerate().map(|(i, t)| (*t, i)).collect();
        let source_idx = *index.get(source)?;

        let successors: Vec<Vec<(usize, f64)>> = tokens
            .iter()
            .map(|token| {
                graph
                    .successors(token)
                    .filter_map(|(to, edge)| index.get(to).map(|&v| (v, adjusted_weight(edge))))
                    .collect()
            })
            .collect();

        let n = tokens.len();
        let mut distance = vec![f64::INFINITY; n];
        let mut predecessor = vec![None; n];
        distance[source_idx] = 0.0;

        for pass in 0..n.saturating_sub(1) {
            let mut updated = false;
            for (u, edges) in successors.iter().enumerate() {
                if !distance[u].is_finite() {
                    continue;
                }
                for &(v, w) in edges {
                    if distance[u] + w < distance[v] {
                        distance[v] = distance[u] + w;
                        predecessor[v] = Some(u);
                        updated = true;
                    }
                }
            }
            if !updated {
                tracing::trace!("Relaxation converged after {} passes", pass + 1);
                break;
            }
        }

        let mut flagged = BTreeSet::new();
        for (u, edges) in successors.iter().enumerate() {
            if !distance[u].is_finite() {
                continue;
            }
            for &(v, w) in edges {
                if distance[u] + w < distance[v] {
                    flagged.insert(v);
                }
            }
        }

        Some(Self {
            tokens,
            successors,
            predecessor,
            flagged,
        })
    }

    fn weight(&self, u: usize, v: usize) -> Option<f64> {
        self.successors[u]
            .iter()
            .find(|(to, _)| *to == v)
            .map(|(_, w)| *w)
    }

    /// Total adjusted weight of a closed index path, if every hop exists
    fn cycle_weight(&self, cycle: &[usize]) -> Option<f64> {
        cycle
            .windows(2)
            .map(|hop| self.weight(hop[0], hop[1]))
            .sum()
    }

    fn to_path(&self, cycle: &[usize]) -> Vec<String> {
        cycle.iter().map(|&i| self.tokens[i].to_string()).collect()
    }
}

/// Hop-bounded DFS state for one flagged node
struct CycleSearch<'r, 'g> {
    relaxation: &'r Relaxation<'g>,
    max_hops: usize,
    budget: usize,
    expansions: usize,
}

impl<'r, 'g> CycleSearch<'r, 'g> {
    /// Collect every negative cycle closed along simple paths from `start`
    fn cycles_from(&mut self, start: usize, flagged: usize) -> Result<Vec<Vec<usize>>> {
        let mut cycles = Vec::new();
        let mut path = vec![start];
        let mut weights = Vec::new();
        let mut on_path = vec![false; self.relaxation.tokens.len()];
        on_path[start] = true;

        self.dfs(&mut path, &mut weights, &mut on_path, &mut cycles, flagged)?;
        Ok(cycles)
    }

    fn dfs(
        &mut self,
        path: &mut Vec<usize>,
        weights: &mut Vec<f64>,
        on_path: &mut [bool],
        cycles: &mut Vec<Vec<usize>>,
        flagged: usize,
    ) -> Result<()> {
        self.expansions += 1;
        if self.expansions > self.budget {
            return Err(DetectorError::SearchBudgetExhausted {
                node: self.relaxation.tokens[flagged].to_string(),
                budget: self.budget,
            });
        }

        let relaxation = self.relaxation;
        let depth = path.len() - 1;
        let Some(&current) = path.last() else {
            return Ok(());
        };

        for &(next, w) in &relaxation.successors[current] {
            if on_path[next] {
                // Close the loop from the first occurrence of `next`
                let Some(start) = path.iter().position(|&p| p == next) else {
                    continue;
                };
                let hops = path.len() - start;
                let total: f64 = weights[start..].iter().sum::<f64>() + w;
                if hops <= self.max_hops && total < NEGATIVE_CYCLE_EPSILON {
                    let mut cycle = path[start..].to_vec();
                    cycle.push(next);
                    cycles.push(cycle);
                }
            } else if depth < self.max_hops {
                path.push(next);
                weights.push(w);
                on_path[next] = true;

                let result = self.dfs(path, weights, on_path, cycles, flagged);

                on_path[next] = false;
                weights.pop();
                path.pop();
                result?;
            }
        }

        Ok(())
    }
}

/// Full-graph negative-cycle search from a single source token
#[derive(Debug, Clone, Default)]
pub struct BellmanFordDetector {
    config: DetectorConfig,
}

impl BellmanFordDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Tokens flagged as lying on (or downstream of) a negative cycle
    /// reachable from `source`
    pub fn negative_cycle_nodes(&self, graph: &TokenGraph, source: &str) -> Result<Vec<String>> {
        let relaxation = Relaxation::run(graph, source)
            .ok_or_else(|| DetectorError::SourceNotFound(source.to_string()))?;
        Ok(relaxation
            .flagged
            .iter()
            .map(|&i| relaxation.tokens[i].to_string())
            .collect())
    }

    /// Walk predecessors from `node` until the chain loops
    fn predecessor_cycle(&self, relaxation: &Relaxation<'_>, node: usize) -> Option<Vec<usize>> {
        let n = relaxation.tokens.len();

        // After n steps back the walk is guaranteed to sit on the loop
        let mut on_loop = node;
        for _ in 0..n {
            on_loop = relaxation.predecessor[on_loop]?;
        }

        let mut reversed = vec![on_loop];
        let mut current = relaxation.predecessor[on_loop]?;
        while current != on_loop {
            if reversed.len() > n {
                return None;
            }
            reversed.push(current);
            current = relaxation.predecessor[current]?;
        }
        reversed.reverse();

        // Start at the flagged node when it lies on the loop
        if let Some(pos) = reversed.iter().position(|&i| i == node) {
            reversed.rotate_left(pos);
        }
        let first = reversed[0];
        reversed.push(first);
        Some(reversed)
    }

    fn accept(&self, relaxation: &Relaxation<'_>, cycle: &[usize]) -> bool {
        cycle.len() <= self.config.max_hops + 1
            && relaxation
                .cycle_weight(cycle)
                .is_some_and(|w| w < NEGATIVE_CYCLE_EPSILON)
    }

    /// Turn one flagged node into a concrete negative cycle
    fn reconstruct(&self, relaxation: &Relaxation<'_>, node: usize) -> Result<Option<Vec<usize>>> {
        if let Some(cycle) = self.predecessor_cycle(relaxation, node) {
            if self.accept(relaxation, &cycle) {
                return Ok(Some(cycle));
            }
            tracing::debug!(
                "Predecessor loop through {} rejected ({} nodes), searching",
                relaxation.tokens[node],
                cycle.len()
            );
        }

        let mut search = CycleSearch {
            relaxation,
            max_hops: self.config.max_hops,
            budget: self.config.search_budget,
            expansions: 0,
        };

        let shortest = search
            .cycles_from(node, node)?
            .into_iter()
            .filter(|c| self.accept(relaxation, c))
            .min_by_key(Vec::len);
        if shortest.is_some() {
            return Ok(shortest);
        }

        for other in (0..relaxation.tokens.len()).filter(|&i| i != node) {
            let found = search
                .cycles_from(other, node)?
                .into_iter()
                .find(|c| c.contains(&node) && self.accept(relaxation, c));
            if found.is_some() {
                return Ok(found);
            }
        }

        Ok(None)
    }
}

impl CycleDetector for BellmanFordDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::BellmanFord
    }

    fn detect(&self, graph: &TokenGraph, source: Option<&str>) -> Vec<Opportunity> {
        let mut opportunities = Vec::new();

        if let Err(e) = self.config.validate() {
            tracing::warn!("Bellman-Ford skipped: {}", e);
            return opportunities;
        }

        let source = match source.map(str::to_string).or_else(|| select_source(graph)) {
            Some(source) => source,
            None => {
                tracing::warn!("Bellman-Ford skipped: graph is empty");
                return opportunities;
            }
        };

        let Some(relaxation) = Relaxation::run(graph, &source) else {
            tracing::warn!("{}", DetectorError::SourceNotFound(source));
            return opportunities;
        };

        if relaxation.flagged.is_empty() {
            tracing::debug!("No negative cycle reachable from {}", source);
            return opportunities;
        }

        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let mut cycles_found = 0usize;

        for &node in &relaxation.flagged {
            let token = relaxation.tokens[node];

            let cycle = match self.reconstruct(&relaxation, node) {
                Ok(Some(cycle)) => cycle,
                Ok(None) => {
                    tracing::debug!("No cycle within {} hops through {}", self.config.max_hops, token);
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Skipping flagged node {}: {}", token, e);
                    continue;
                }
            };

            let path = relaxation.to_path(&cycle);
            if !seen.insert(canonical_cycle(&path)) {
                continue;
            }
            cycles_found += 1;

            match score_cycle(graph, &path, DetectorKind::BellmanFord, &self.config) {
                Ok(Some(opportunity)) => opportunities.push(opportunity),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping cycle through {}: {}", token, e),
            }
        }

        tracing::info!(
            "Bellman-Ford from {}: {} flagged nodes, {} distinct cycles, {} opportunities",
            source,
            relaxation.flagged.len(),
            cycles_found,
            opportunities.len()
        );

        opportunities
    }
}
