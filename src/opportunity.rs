//! Opportunity Scoring
//!
//! Turns a closed walk over the graph into a scored opportunity:
//! - Re-checks every hop against the live graph
//! - Converts the log-space cost into a profit ratio
//! - Deducts route and platform fees against the base amount
//! - Discounts confidence for slippage and price impact risk
//!
//! Every detector funnels its candidates through [`score_cycle`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::DetectorConfig;
use crate::error::{DetectorError, Result};
use crate::graph::TokenGraph;

/// Which search produced an opportunity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectorKind {
    BellmanFord,
    Triangle,
    TwoHop,
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorKind::BellmanFord => write!(f, "Bellman-Ford"),
            DetectorKind::Triangle => write!(f, "Triangle"),
            DetectorKind::TwoHop => write!(f, "Two-Hop"),
        }
    }
}

/// A scored arbitrage cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Closed walk: first token == last token
    pub path: Vec<String>,
    /// Shortened labels for display
    pub path_symbols: Vec<String>,
    /// Profit ratio after fees (0.05 = 5%)
    pub profit_ratio: f64,
    /// Adjusted log-space weight of the whole cycle
    pub total_weight: f64,
    /// Route fees plus platform fees
    pub total_fee: f64,
    pub hop_count: usize,
    /// Heuristic in [0, 1]
    pub confidence_score: f64,
    /// Profit in base-amount units
    pub estimated_profit: f64,
    pub detector: DetectorKind,
}

impl Opportunity {
    /// Calculate profit as a percentage
    pub fn profit_percentage(&self) -> f64 {
        self.profit_ratio * 100.0
    }

    /// Get a formatted string of the token path
    pub fn token_path(&self) -> String {
        self.path_symbols.join(" -> ")
    }

    /// Get a summary string for logging
    pub fn summary(&self) -> String {
        format!(
            "{} | {} hops | {:.4}% profit | est. {:.6} | fee {:.6} | confidence {:.2} | weight {:.6} | {}",
            self.token_path(),
            self.hop_count,
            self.profit_percentage(),
            self.estimated_profit,
            self.total_fee,
            self.confidence_score,
            self.total_weight,
            self.detector
        )
    }
}

/// Display label for a token id: long ids become `abcd...wxyz`
pub fn short_label(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 10 {
        return token.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Rotate a closed walk so it starts at its smallest token.
/// Rotations of the same directed cycle map to the same key.
pub fn canonical_cycle(path: &[String]) -> Vec<String> {
    if path.len() < 2 {
        return path.to_vec();
    }
    let body = &path[..path.len() - 1];
    let start = body
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map_or(0, |(i, _)| i);

    let mut rotated: Vec<String> = body[start..].iter().chain(&body[..start]).cloned().collect();
    rotated.push(rotated[0].clone());
    rotated
}

/// Score a closed walk. `Ok(None)` means the walk is not an opportunity
/// (stale hop, non-negative cost, too long, or below the profit threshold).
pub fn score_cycle(
    graph: &TokenGraph,
    path: &[String],
    detector: DetectorKind,
    config: &DetectorConfig,
) -> Result<Option<Opportunity>> {
    if path.len() < 2 || path.first() != path.last() {
        tracing::debug!("Rejecting {:?}: not a closed walk", path);
        return Ok(None);
    }

    let hop_count = path.len() - 1;
    if hop_count > config.max_hops {
        tracing::debug!(
            "Rejecting {:?}: {} hops exceeds max {}",
            path,
            hop_count,
            config.max_hops
        );
        return Ok(None);
    }

    let mut total_weight = 0.0;
    let mut total_fee = 0.0;
    let mut total_slippage = 0.0;
    let mut total_price_impact = 0.0;
    let mut platform_fees = 0.0;

    for hop in path.windows(2) {
        let Some(edge) = graph.edge(&hop[0], &hop[1]) else {
            tracing::debug!("Rejecting {:?}: no edge {} -> {}", path, hop[0], hop[1]);
            return Ok(None);
        };

        total_weight += edge.weight;
        total_fee += edge.total_fee;
        total_slippage += edge.slippage_decimal();
        total_price_impact += edge.price_impact_pct.abs();
        platform_fees += edge.platform_fee;
    }

    let adjusted_weight = total_weight + total_slippage + total_price_impact / 100.0;
    if !adjusted_weight.is_finite() {
        return Err(DetectorError::Internal(format!(
            "non-finite adjusted weight {} for {:?}",
            adjusted_weight, path
        )));
    }

    // Negative cost is required for a profitable round trip
    if adjusted_weight >= 0.0 {
        return Ok(None);
    }

    let base_profit_ratio = (-adjusted_weight).exp() - 1.0;
    if !base_profit_ratio.is_finite() {
        return Err(DetectorError::Internal(format!(
            "profit ratio overflow for {:?} (adjusted weight {})",
            path, adjusted_weight
        )));
    }

    let total_all_fees = total_fee + platform_fees;
    let actual_profit_ratio = base_profit_ratio - total_all_fees / config.base_amount;
    let estimated_profit = config.base_amount * actual_profit_ratio;
    if !actual_profit_ratio.is_finite() || !estimated_profit.is_finite() {
        return Err(DetectorError::Internal(format!(
            "non-finite profit for {:?} (fees {}, base amount {})",
            path, total_all_fees, config.base_amount
        )));
    }

    let slippage_risk = (total_slippage * 10.0).min(1.0);
    let price_impact_risk = (total_price_impact / 10.0).min(1.0);

    let base_confidence = if total_all_fees > 0.0 {
        ((estimated_profit / total_all_fees).max(0.0) / 5.0).min(1.0)
    } else {
        0.5
    };
    let confidence_score =
        (base_confidence * (1.0 - slippage_risk) * (1.0 - price_impact_risk)).clamp(0.0, 1.0);

    if actual_profit_ratio < config.min_profit_threshold {
        tracing::debug!(
            "Filtered: {:?} | profit {:.4}% below threshold {:.4}%",
            path,
            actual_profit_ratio * 100.0,
            config.min_profit_threshold * 100.0
        );
        return Ok(None);
    }

    Ok(Some(Opportunity {
        path: path.to_vec(),
        path_symbols: path.iter().map(|t| short_label(t)).collect(),
        profit_ratio: actual_profit_ratio,
        total_weight: adjusted_weight,
        total_fee: total_all_fees,
        hop_count,
        confidence_score,
        estimated_profit,
        detector,
    }))
}
