//! Detector Configuration
//!
//! Shared by every detector and the coordinator.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::DetectorError;

/// Minimum profit ratio to report (0.01 = 1%)
pub const DEFAULT_MIN_PROFIT_THRESHOLD: f64 = 0.01;
/// Maximum swaps in a cycle
pub const DEFAULT_MAX_HOPS: usize = 4;
/// Trade size in the common fee unit (1 SOL)
pub const DEFAULT_BASE_AMOUNT: f64 = 1.0;
/// Node expansions allowed per flagged node during DFS reconstruction
pub const DEFAULT_SEARCH_BUDGET: usize = 10_000;

/// How the coordinator collapses overlapping opportunities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupStrategy {
    /// Same set of tokens, regardless of order or direction
    #[default]
    TokenSet,
    /// Same ordered cycle, regardless of the starting token
    OrderedPath,
}

impl FromStr for DedupStrategy {
    type Err = DetectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token-set" | "token_set" | "tokenset" => Ok(DedupStrategy::TokenSet),
            "ordered-path" | "ordered_path" | "orderedpath" => Ok(DedupStrategy::OrderedPath),
            other => Err(DetectorError::InvalidConfig(format!(
                "unknown dedup strategy '{}' (expected token-set or ordered-path)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Minimum actual profit ratio kept after fees (fraction)
    pub min_profit_threshold: f64,
    /// Upper bound on hops per cycle (>= 1)
    pub max_hops: usize,
    /// Trade size used to convert absolute fees into a ratio
    pub base_amount: f64,
    /// DFS expansions allowed per flagged node before giving up
    pub search_budget: usize,
    pub dedup: DedupStrategy,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_profit_threshold: DEFAULT_MIN_PROFIT_THRESHOLD,
            max_hops: DEFAULT_MAX_HOPS,
            base_amount: DEFAULT_BASE_AMOUNT,
            search_budget: DEFAULT_SEARCH_BUDGET,
            dedup: DedupStrategy::default(),
        }
    }
}

impl DetectorConfig {
    pub fn new(min_profit_threshold: f64, max_hops: usize, base_amount: f64) -> Self {
        Self {
            min_profit_threshold,
            max_hops,
            base_amount,
            ..Self::default()
        }
    }

    pub fn with_search_budget(mut self, search_budget: usize) -> Self {
        self.search_budget = search_budget;
        self
    }

    pub fn with_dedup(mut self, dedup: DedupStrategy) -> Self {
        self.dedup = dedup;
        self
    }

    /// Check every field is inside its domain
    pub fn validate(&self) -> Result<(), DetectorError> {
        if self.max_hops < 1 {
            return Err(DetectorError::InvalidConfig(
                "max_hops must be at least 1".into(),
            ));
        }
        if !self.base_amount.is_finite() || self.base_amount <= 0.0 {
            return Err(DetectorError::InvalidConfig(format!(
                "base_amount must be positive and finite, got {}",
                self.base_amount
            )));
        }
        if !self.min_profit_threshold.is_finite() {
            return Err(DetectorError::InvalidConfig(format!(
                "min_profit_threshold must be finite, got {}",
                self.min_profit_threshold
            )));
        }
        if self.search_budget == 0 {
            return Err(DetectorError::InvalidConfig(
                "search_budget must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Load configuration from the environment (and `.env` if present).
    /// Unset variables keep their defaults.
    pub fn from_env() -> eyre::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            min_profit_threshold: env_or("ARB_MIN_PROFIT_THRESHOLD", defaults.min_profit_threshold)?,
            max_hops: env_or("ARB_MAX_HOPS", defaults.max_hops)?,
            base_amount: env_or("ARB_BASE_AMOUNT", defaults.base_amount)?,
            search_budget: env_or("ARB_SEARCH_BUDGET", defaults.search_budget)?,
            dedup: match env::var("ARB_DEDUP") {
                Ok(raw) => raw.parse()?,
                Err(_) => defaults.dedup,
            },
        };

        config.validate()?;
        Ok(config)
    }
}

fn env_or<T>(key: &str, default: T) -> eyre::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| eyre::eyre!("Failed to parse {}='{}': {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}
