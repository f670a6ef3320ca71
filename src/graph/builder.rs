use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::types::Edge;
use crate::error::{DetectorError, Result};

/// Directed token graph: one edge per ordered `(from, to)` pair.
///
/// Adjacency is kept in ordered maps so every traversal visits tokens in
/// lexicographic order, which keeps detector output deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenGraph {
    adjacency: BTreeMap<String, BTreeMap<String, Edge>>,
    edge_count: usize,
}

impl TokenGraph {
    /// Create a new empty token graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the node for a token
    fn ensure_node(&mut self, token: &str) -> &mut BTreeMap<String, Edge> {
        self.adjacency.entry(token.to_string()).or_default()
    }

    /// Insert an edge, replacing any existing edge for the same pair.
    /// Returns the replaced edge.
    pub(crate) fn insert_edge(&mut self, edge: Edge) -> Option<Edge> {
        self.ensure_node(&edge.to);
        let to = edge.to.clone();
        let replaced = self.ensure_node(&edge.from).insert(to, edge);
        if replaced.is_none() {
            self.edge_count += 1;
        }
        replaced
    }

    pub fn contains(&self, token: &str) -> bool {
        self.adjacency.contains_key(token)
    }

    /// All tokens in lexicographic order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    /// Get the edge for a pair, if the graph has one
    pub fn edge(&self, from: &str, to: &str) -> Option<&Edge> {
        self.adjacency.get(from)?.get(to)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edge(from, to).is_some()
    }

    /// Outgoing edges of `token`, ordered by successor
    pub fn successors<'a>(&'a self, token: &str) -> impl Iterator<Item = (&'a str, &'a Edge)> + 'a {
        self.adjacency
            .get(token)
            .into_iter()
            .flat_map(|succ| succ.iter().map(|(to, edge)| (to.as_str(), edge)))
    }

    /// Every edge, ordered by `(from, to)`
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.adjacency.values().flat_map(|succ| succ.values())
    }

    pub fn out_degree(&self, token: &str) -> usize {
        self.adjacency.get(token).map_or(0, BTreeMap::len)
    }

    pub fn in_degree(&self, token: &str) -> usize {
        self.adjacency
            .values()
            .filter(|succ| succ.contains_key(token))
            .count()
    }

    pub fn degree(&self, token: &str) -> usize {
        self.in_degree(token) + self.out_degree(token)
    }

    /// Get the number of nodes (tokens) in the graph
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Get the number of edges (swap routes) in the graph
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        let bidirectional_pairs = self
            .edges()
            .filter(|e| e.from < e.to && self.has_edge(&e.to, &e.from))
            .count();

        GraphStats {
            nodes: self.node_count(),
            edges: self.edge_count(),
            bidirectional_pairs,
            unidirectional_edges: self.edge_count() - bidirectional_pairs * 2,
        }
    }
}

/// Shape summary of a token graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    /// Token pairs quoted in both directions
    pub bidirectional_pairs: usize,
    pub unidirectional_edges: usize,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tokens, {} edges ({} bidirectional pairs, {} unidirectional edges)",
            self.nodes, self.edges, self.bidirectional_pairs, self.unidirectional_edges
        )
    }
}

/// Summary of one successful build
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub built_at: DateTime<Utc>,
    /// Records supplied, duplicates included
    pub input_edges: usize,
    pub node_count: usize,
    pub edge_count: usize,
    /// Records that replaced an earlier record for the same pair
    pub overwritten_edges: usize,
}

/// Receives a report after every successful build
pub trait BuildObserver: Send + Sync {
    fn on_build(&self, report: &BuildReport);
}

impl<F> BuildObserver for F
where
    F: Fn(&BuildReport) + Send + Sync,
{
    fn on_build(&self, report: &BuildReport) {
        self(report)
    }
}

/// Observer that keeps every report. Clones share the same history.
#[derive(Debug, Clone, Default)]
pub struct BuildHistory {
    reports: Arc<Mutex<Vec<BuildReport>>>,
}

impl BuildHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<BuildReport> {
        self.reports.lock().clone()
    }

    pub fn last(&self) -> Option<BuildReport> {
        self.reports.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }
}

impl BuildObserver for BuildHistory {
    fn on_build(&self, report: &BuildReport) {
        self.reports.lock().push(report.clone());
    }
}

/// Validates edge records and assembles a [`TokenGraph`]
#[derive(Default)]
pub struct GraphBuilder {
    observer: Option<Box<dyn BuildObserver>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an observer notified after each successful build
    pub fn with_observer(mut self, observer: impl BuildObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Build a graph from typed edges. Later edges for the same pair win.
    pub fn build(&self, edges: &[Edge]) -> Result<TokenGraph> {
        if edges.is_empty() {
            return Err(DetectorError::EmptyInput);
        }

        for (index, edge) in edges.iter().enumerate() {
            validate_edge(index, edge)?;
        }

        Ok(self.assemble(edges.iter().cloned(), edges.len()))
    }

    /// Build a graph from loosely-typed records (e.g. decoded quote JSON)
    pub fn build_from_records(&self, records: &[Value]) -> Result<TokenGraph> {
        if records.is_empty() {
            return Err(DetectorError::EmptyInput);
        }

        let edges = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let edge = edge_from_record(index, record)?;
                validate_edge(index, &edge)?;
                Ok(edge)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(self.assemble(edges.into_iter(), records.len()))
    }

    fn assemble(&self, edges: impl Iterator<Item = Edge>, input_edges: usize) -> TokenGraph {
        let mut graph = TokenGraph::new();
        let mut overwritten_edges = 0;

        for edge in edges {
            if let Some(previous) = graph.insert_edge(edge) {
                tracing::debug!(
                    "Replacing edge {} -> {} (last record wins)",
                    previous.from,
                    previous.to
                );
                overwritten_edges += 1;
            }
        }

        tracing::info!(
            "Graph built: {} Nodes, {} Edges",
            graph.node_count(),
            graph.edge_count()
        );
        if overwritten_edges > 0 {
            tracing::info!("  {} duplicate pair records overwritten", overwritten_edges);
        }

        if let Some(observer) = &self.observer {
            observer.on_build(&BuildReport {
                built_at: Utc::now(),
                input_edges,
                node_count: graph.node_count(),
                edge_count: graph.edge_count(),
                overwritten_edges,
            });
        }

        graph
    }
}

/// Range and sanity checks shared by both input forms
fn validate_edge(index: usize, edge: &Edge) -> Result<()> {
    if edge.from.trim().is_empty() {
        return Err(DetectorError::validation(index, "empty from_token"));
    }
    if edge.to.trim().is_empty() {
        return Err(DetectorError::validation(index, "empty to_token"));
    }
    if !edge.price_ratio.is_finite() || edge.price_ratio <= 0.0 {
        return Err(DetectorError::validation(
            index,
            format!("price_ratio must be positive and finite, got {}", edge.price_ratio),
        ));
    }
    if !edge.weight.is_finite() {
        return Err(DetectorError::validation(
            index,
            format!("weight must be a finite number, got {}", edge.weight),
        ));
    }
    for (name, value) in [
        ("platform_fee", edge.platform_fee),
        ("price_impact_pct", edge.price_impact_pct),
        ("total_fee", edge.total_fee),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(DetectorError::validation(
                index,
                format!("{} must be non-negative, got {}", name, value),
            ));
        }
    }
    Ok(())
}

fn edge_from_record(index: usize, record: &Value) -> Result<Edge> {
    let obj = record.as_object().ok_or_else(|| {
        DetectorError::validation(
            index,
            format!("expected an edge object, got {}", value_kind(record)),
        )
    })?;

    let from = token_field(obj, index, "from_token", "from")?;
    let to = token_field(obj, index, "to_token", "to")?;
    let price_ratio = number_field(obj, index, "price_ratio")?;
    let weight = number_field(obj, index, "weight")?;
    let platform_fee = number_field(obj, index, "platform_fee")?;
    let price_impact_pct = number_field(obj, index, "price_impact_pct")?;
    let total_fee = number_field(obj, index, "total_fee")?;

    let raw_slippage = required_field(obj, index, "slippage_bps")?;
    let slippage_bps = raw_slippage
        .as_u64()
        .and_then(|bps| u32::try_from(bps).ok())
        .ok_or_else(|| {
            DetectorError::validation(
                index,
                format!(
                    "slippage_bps must be a non-negative integer, got {}",
                    raw_slippage
                ),
            )
        })?;

    Ok(Edge {
        from,
        to,
        price_ratio,
        weight,
        slippage_bps,
        platform_fee,
        price_impact_pct,
        total_fee,
    })
}

fn required_field<'a>(obj: &'a Map<String, Value>, index: usize, name: &str) -> Result<&'a Value> {
    match obj.get(name) {
        None => Err(DetectorError::validation(
            index,
            format!("missing required attribute '{}'", name),
        )),
        Some(Value::Null) => Err(DetectorError::validation(
            index,
            format!("null value for attribute '{}'", name),
        )),
        Some(value) => Ok(value),
    }
}

fn token_field(obj: &Map<String, Value>, index: usize, name: &str, alias: &str) -> Result<String> {
    let key = if obj.contains_key(name) || !obj.contains_key(alias) {
        name
    } else {
        alias
    };
    let value = required_field(obj, index, key)?;
    value.as_str().map(str::to_string).ok_or_else(|| {
        DetectorError::validation(
            index,
            format!("{} must be a string, got {}", key, value_kind(value)),
        )
    })
}

fn number_field(obj: &Map<String, Value>, index: usize, name: &str) -> Result<f64> {
    let value = required_field(obj, index, name)?;
    value.as_f64().ok_or_else(|| {
        DetectorError::validation(
            index,
            format!("{} must be a number, got {}", name, value_kind(value)),
        )
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(from: &str, to: &str, price_ratio: f64) -> Value {
        json!({
            "from_token": from,
            "to_token": to,
            "price_ratio": price_ratio,
            "weight": -price_ratio.ln(),
            "slippage_bps": 20,
            "platform_fee": 0.0005,
            "price_impact_pct": 0.02,
            "total_fee": 0.001
        })
    }

    fn index_of(err: DetectorError) -> usize {
        match err {
            DetectorError::Validation { index, .. } => index,
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_nodes_are_union_of_endpoints() {
        let graph = GraphBuilder::new()
            .build(&[Edge::new("SOL", "USDC", 180.0), Edge::new("USDC", "USDT", 1.0)])
            .unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.contains("USDT"));
        assert_eq!(graph.out_degree("USDT"), 0);
        assert_eq!(graph.in_degree("USDT"), 1);
        assert_eq!(graph.tokens().collect::<Vec<_>>(), vec!["SOL", "USDC", "USDT"]);
    }

    #[test]
    fn test_last_write_wins() {
        let first = Edge::new("A", "B", 2.0).with_total_fee(0.1);
        let second = Edge::new("A", "B", 3.0).with_total_fee(0.2);
        let history = BuildHistory::new();
        let graph = GraphBuilder::new()
            .with_observer(history.clone())
            .build(&[first, Edge::new("B", "A", 0.5), second.clone()])
            .unwrap();

        assert_eq!(graph.edge("A", "B"), Some(&second));
        assert_eq!(graph.edge_count(), 2);

        let report = history.last().unwrap();
        assert_eq!(report.input_edges, 3);
        assert_eq!(report.edge_count, 2);
        assert_eq!(report.overwritten_edges, 1);
    }

    #[test]
    fn test_empty_input_fails() {
        assert_eq!(GraphBuilder::new().build(&[]), Err(DetectorError::EmptyInput));
        assert_eq!(
            GraphBuilder::new().build_from_records(&[]),
            Err(DetectorError::EmptyInput)
        );
    }

    #[test]
    fn test_negative_slippage_fails() {
        let mut bad = record("SOL", "USDC", 180.0);
        bad["slippage_bps"] = json!(-5);
        let err = GraphBuilder::new()
            .build_from_records(&[record("USDC", "SOL", 0.0055), bad])
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(index_of(err), 1);
    }

    #[test]
    fn test_fractional_slippage_fails() {
        let mut bad = record("SOL", "USDC", 180.0);
        bad["slippage_bps"] = json!(12.5);
        assert_eq!(
            index_of(GraphBuilder::new().build_from_records(&[bad]).unwrap_err()),
            0
        );
    }

    #[test]
    fn test_non_numeric_weight_fails() {
        let mut bad = record("SOL", "USDC", 180.0);
        bad["weight"] = json!("heavy");
        let err = GraphBuilder::new().build_from_records(&[bad]).unwrap_err();
        assert!(err.to_string().contains("weight must be a number"));

        let nan_weight = Edge::new("SOL", "USDC", 180.0).with_weight(f64::NAN);
        assert!(GraphBuilder::new().build(&[nan_weight]).is_err());
    }

    #[test]
    fn test_empty_from_token_fails() {
        let err = GraphBuilder::new()
            .build(&[Edge::new("SOL", "USDC", 180.0), Edge::new("", "USDC", 1.0)])
            .unwrap_err();
        assert_eq!(err, DetectorError::validation(1, "empty from_token"));
    }

    #[test]
    fn test_shape_and_missing_attribute_failures() {
        let builder = GraphBuilder::new();
        assert!(builder.build_from_records(&[json!([1, 2, 3])]).is_err());

        let mut missing = record("A", "B", 1.0);
        missing.as_object_mut().unwrap().remove("total_fee");
        let err = builder.build_from_records(&[missing]).unwrap_err();
        assert!(err.to_string().contains("missing required attribute 'total_fee'"));

        let mut null = record("A", "B", 1.0);
        null["platform_fee"] = Value::Null;
        let err = builder.build_from_records(&[null]).unwrap_err();
        assert!(err.to_string().contains("null value"));
    }

    #[test]
    fn test_negative_amounts_fail() {
        let builder = GraphBuilder::new();
        for field in ["price_ratio", "platform_fee", "price_impact_pct", "total_fee"] {
            let mut bad = record("A", "B", 1.0);
            bad[field] = json!(-0.1);
            assert!(
                builder.build_from_records(&[bad]).is_err(),
                "negative {} should be rejected",
                field
            );
        }
    }

    #[test]
    fn test_record_aliases() {
        let graph = GraphBuilder::new()
            .build_from_records(&[json!({
                "from": "A",
                "to": "B",
                "price_ratio": 1.5,
                "weight": -(1.5f64).ln(),
                "slippage_bps": 0,
                "platform_fee": 0,
                "price_impact_pct": 0,
                "total_fee": 0
            })])
            .unwrap();
        assert!(graph.has_edge("A", "B"));
    }

    #[test]
    fn test_closure_observer() {
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        GraphBuilder::new()
            .with_observer(move |report: &BuildReport| *sink.lock() += report.node_count)
            .build(&[Edge::new("A", "B", 1.0)])
            .unwrap();
        assert_eq!(*seen.lock(), 2);
    }

    #[test]
    fn test_stats() {
        let graph = GraphBuilder::new()
            .build(&[
                Edge::new("A", "B", 2.0),
                Edge::new("B", "A", 0.5),
                Edge::new("B", "C", 1.0),
            ])
            .unwrap();
        let stats = graph.stats();
        assert_eq!(stats.bidirectional_pairs, 1);
        assert_eq!(stats.unidirectional_edges, 1);
        assert_eq!(graph.degree("B"), 3);
        assert!(stats.to_string().starts_with("3 tokens, 3 edges"));
    }
}
