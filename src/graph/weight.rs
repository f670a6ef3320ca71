//! Per-hop cost model shared by every detector.
//!
//! `weight` already lives in ln-space; slippage and price impact are added
//! as penalties in the same unit so that path sums stay comparable.

use super::types::Edge;

/// Adjusted log-space cost of traversing `edge`
pub fn adjusted_weight(edge: &Edge) -> f64 {
    edge.weight + edge.slippage_decimal() + edge.price_impact_pct.abs() / 100.0
}

/// Sum of adjusted weights over a sequence of hops
pub fn path_adjusted_weight<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> f64 {
    edges.into_iter().map(adjusted_weight).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_free_edge_keeps_raw_weight() {
        let edge = Edge::new("A", "B", 1.25);
        assert_eq!(adjusted_weight(&edge), edge.weight);
    }

    #[test]
    fn test_penalties_are_additive() {
        let edge = Edge::new("A", "B", 1.0)
            .with_slippage_bps(50)
            .with_price_impact_pct(0.2);
        // 0 + 0.005 + 0.002
        assert!((adjusted_weight(&edge) - 0.007).abs() < 1e-15);
    }

    #[test]
    fn test_price_impact_sign_is_ignored() {
        let up = Edge::new("A", "B", 2.0).with_price_impact_pct(0.3);
        let down = Edge::new("A", "B", 2.0).with_price_impact_pct(-0.3);
        assert_eq!(adjusted_weight(&up), adjusted_weight(&down));
    }

    #[test]
    fn test_monotonic_in_slippage_and_impact() {
        let base = Edge::new("A", "B", 1.1).with_slippage_bps(10);
        let more_slippage = base.clone().with_slippage_bps(11);
        let more_impact = base.clone().with_price_impact_pct(0.01);
        assert!(adjusted_weight(&more_slippage) > adjusted_weight(&base));
        assert!(adjusted_weight(&more_impact) > adjusted_weight(&base));
    }

    #[test]
    fn test_path_sum() {
        let hops = [Edge::new("A", "B", 2.0), Edge::new("B", "A", 0.5)];
        assert!(path_adjusted_weight(&hops).abs() < 1e-12);
    }
}
