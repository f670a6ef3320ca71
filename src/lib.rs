//! Arbitrage cycle scanner
//!
//! Turns a batch of directed exchange-rate quotes into a token graph with
//! `-ln(rate)` edge weights, then looks for profitable closed loops:
//! - Bellman-Ford negative cycles of up to `max_hops` swaps
//! - Triangles (3 swaps)
//! - Two-hop round trips
//!
//! Results are scored, deduplicated and ranked by [`ArbitrageCoordinator`].

pub mod config;
pub mod coordinator;
pub mod detect;
pub mod error;
pub mod graph;
pub mod opportunity;

pub use config::{DedupStrategy, DetectorConfig};
pub use coordinator::{detect_arbitrage, log_opportunities, ArbitrageCoordinator};
pub use detect::{BellmanFordDetector, CycleDetector, TriangleDetector, TwoHopDetector};
pub use error::{DetectorError, Result};
pub use graph::{Edge, GraphBuilder, TokenGraph};
pub use opportunity::{DetectorKind, Opportunity};
