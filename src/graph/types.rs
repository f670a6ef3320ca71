use serde::{Deserialize, Serialize};

/// Edge data representing one quoted swap route between two tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(alias = "from_token")]
    pub from: String,
    #[serde(alias = "to_token")]
    pub to: String,
    pub price_ratio: f64,      // Output per unit of input
    pub weight: f64,           // -ln(price_ratio) for cycle detection
    pub slippage_bps: u32,     // Quoted slippage tolerance
    pub platform_fee: f64,     // Platform fee in the common fee unit
    pub price_impact_pct: f64, // Magnitude is what counts; consumers use |x|
    pub total_fee: f64,        // Aggregated route fee in the common fee unit
}

impl Edge {
    /// Create a fee-free edge from a quoted price ratio
    pub fn new(from: impl Into<String>, to: impl Into<String>, price_ratio: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            price_ratio,
            weight: -price_ratio.ln(), // Negative log for cycle detection
            slippage_bps: 0,
            platform_fee: 0.0,
            price_impact_pct: 0.0,
            total_fee: 0.0,
        }
    }

    pub fn with_slippage_bps(mut self, slippage_bps: u32) -> Self {
        self.slippage_bps = slippage_bps;
        self
    }

    pub fn with_platform_fee(mut self, platform_fee: f64) -> Self {
        self.platform_fee = platform_fee;
        self
    }

    pub fn with_price_impact_pct(mut self, price_impact_pct: f64) -> Self {
        self.price_impact_pct = price_impact_pct;
        self
    }

    pub fn with_total_fee(mut self, total_fee: f64) -> Self {
        self.total_fee = total_fee;
        self
    }

    /// Override the log-space weight (quotes may carry their own)
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Slippage as a decimal fraction (1 bps = 0.0001)
    pub fn slippage_decimal(&self) -> f64 {
        self.slippage_bps as f64 / 10_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_is_negative_log_of_price() {
        let edge = Edge::new("SOL", "USDC", 180.0);
        assert!((edge.weight + 180f64.ln()).abs() < 1e-12);
        assert!(edge.weight < 0.0);
    }

    #[test]
    fn test_slippage_decimal() {
        let edge = Edge::new("A", "B", 1.0).with_slippage_bps(25);
        assert!((edge.slippage_decimal() - 0.0025).abs() < 1e-15);
    }

    #[test]
    fn test_deserializes_token_field_aliases() {
        let edge: Edge = serde_json::from_value(serde_json::json!({
            "from_token": "SOL",
            "to_token": "BTC",
            "price_ratio": 0.0035,
            "weight": 5.65,
            "slippage_bps": 30,
            "platform_fee": 0.0008,
            "price_impact_pct": -0.05,
            "total_fee": 0.002
        }))
        .unwrap();
        assert_eq!(edge.from, "SOL");
        assert_eq!(edge.to, "BTC");
        assert_eq!(edge.slippage_bps, 30);
        assert_eq!(edge.price_impact_pct, -0.05);
    }
}
